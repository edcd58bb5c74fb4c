use tokio::sync::mpsc;
use uuid::Uuid;

/// In-process notification that an object landed in the uploads namespace.
/// Delivery is at-least-once overall: the channel is best effort, the
/// sweeper replays anything that slipped through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectCreatedEvent {
    pub file_id: Uuid,
}

/// Sending side of the pipeline event channel, cheap to clone into handlers.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<ObjectCreatedEvent>,
}

impl PipelineHandle {
    /// Publish without blocking the request path. A full or closed channel
    /// is logged and dropped; the stuck-record sweep picks the file up.
    pub fn publish(&self, file_id: Uuid) {
        let event = ObjectCreatedEvent { file_id };
        if let Err(e) = self.tx.try_send(event) {
            tracing::warn!(
                "Pipeline event for file {} not enqueued ({}); sweeper will recover it",
                file_id,
                e
            );
        }
    }
}

/// Build the event channel with the configured buffer.
pub fn channel(buffer: usize) -> (PipelineHandle, mpsc::Receiver<ObjectCreatedEvent>) {
    let (tx, rx) = mpsc::channel(buffer);
    (PipelineHandle { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_events_are_received_in_order() {
        let (handle, mut rx) = channel(8);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        handle.publish(a);
        handle.publish(b);

        assert_eq!(rx.recv().await, Some(ObjectCreatedEvent { file_id: a }));
        assert_eq!(rx.recv().await, Some(ObjectCreatedEvent { file_id: b }));
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (handle, mut rx) = channel(1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        handle.publish(a);
        handle.publish(b); // dropped, buffer is full

        assert_eq!(rx.recv().await, Some(ObjectCreatedEvent { file_id: a }));
        assert!(rx.try_recv().is_err());
    }
}
