pub mod face_recognizer;
pub mod region_extractor;
