mod message_dto;

pub use message_dto::{
    AddBranchDto, CreateMessageDto, EditMessageDto, MessageResponseDto,
};
