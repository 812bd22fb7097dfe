pub mod chat;
pub mod doctor;
pub mod init;
pub mod inspect;
pub mod serve;
