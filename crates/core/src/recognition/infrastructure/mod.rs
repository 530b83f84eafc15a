pub mod scripted_face_recognizer;
