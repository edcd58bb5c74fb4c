mod pipeline_worker;

pub use pipeline_worker::PipelineWorker;
