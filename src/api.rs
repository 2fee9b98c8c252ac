pub mod client;
pub mod flexmeasures;
pub mod home_assistant;
