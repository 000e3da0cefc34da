pub mod gateway;
pub mod openai;
