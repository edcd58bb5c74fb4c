mod client_dto;

pub use client_dto::{
    AuthRequestDto, ClientProfileDto, UpdateClientActiveDto, UpdateClientPolicyDto,
};
