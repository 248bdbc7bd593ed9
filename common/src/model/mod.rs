pub mod directory;
pub mod field;
pub mod loaded_data;
pub mod published;
pub mod report;
pub mod submitter;
pub mod template;
pub mod validator;
