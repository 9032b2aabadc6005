mod share_dto;

pub use share_dto::{
    CreateShareDto, ResolveShareQuery, ResolvedShareDto, ShareResponseDto, UpdateShareDto,
};
