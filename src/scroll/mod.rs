pub mod cue;
