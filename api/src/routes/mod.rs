pub mod answer_questions;
