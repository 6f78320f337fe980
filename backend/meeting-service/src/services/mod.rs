pub mod meeting_service;

pub use meeting_service::{
    external_user_id, truncate_chars, MeetingService, ServiceTimeouts, EXTERNAL_ID_MAX_CHARS,
    JOIN_PARAMS_MESSAGE, LEAVE_PARAMS_MESSAGE,
};
