pub mod matchups;
pub mod recommender;
