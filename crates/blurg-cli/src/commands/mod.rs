pub mod diaries;
pub mod entries;
pub mod misc;
pub mod remote;
