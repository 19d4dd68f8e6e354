use crate::models::{Emotion, ParticipantProfile};

/// Sample class used by the demo binary and simulation mode.
pub fn demo_roster() -> Vec<ParticipantProfile> {
    [
        ("1", "Alice Johnson", "CS-001", Emotion::Focused),
        ("2", "Bob Smith", "CS-002", Emotion::Neutral),
        ("3", "Charlie Davis", "CS-003", Emotion::Confused),
        ("4", "Diana Evans", "CS-004", Emotion::Focused),
        ("5", "Evan Wright", "CS-005", Emotion::Bored),
        ("6", "Fiona Green", "CS-006", Emotion::Distracted),
        ("7", "George Hall", "CS-007", Emotion::Focused),
        ("8", "Hannah Lee", "CS-008", Emotion::Disengaged),
        ("9", "Ian Clark", "CS-009", Emotion::Happy),
        ("10", "Jane Doe", "CS-010", Emotion::Focused),
    ]
    .into_iter()
    .map(|(id, name, roll_no, emotion)| ParticipantProfile::new(id, name, roll_no, emotion))
    .collect()
}
