pub mod answer_questions_route;
pub mod upload_form;
