pub mod inputs;
pub mod jobs;
pub mod run;
