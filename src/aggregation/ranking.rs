use crate::models::{Participant, RankedParticipant};

/// Attention-ordered copy of the roster, most urgent first.
///
/// The sort is stable, so participants sharing a priority keep their roster
/// order. The input slice is left untouched.
pub fn rank_participants(roster: &[Participant]) -> Vec<RankedParticipant> {
    let mut ranked: Vec<RankedParticipant> = roster
        .iter()
        .cloned()
        .map(RankedParticipant::from)
        .collect();
    ranked.sort_by_key(|entry| entry.priority);
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::Emotion;

    fn roster(entries: &[(&str, Emotion)]) -> Vec<Participant> {
        entries
            .iter()
            .enumerate()
            .map(|(idx, (id, emotion))| Participant::unnamed(id, *emotion, idx as u64, Utc::now()))
            .collect()
    }

    fn emotions(ranked: &[RankedParticipant]) -> Vec<Emotion> {
        ranked.iter().map(|entry| entry.participant.emotion).collect()
    }

    #[test]
    fn least_engaged_surface_first() {
        let participants = roster(&[
            ("a", Emotion::Focused),
            ("b", Emotion::Disengaged),
            ("c", Emotion::Bored),
            ("d", Emotion::Confused),
        ]);
        let ranked = rank_participants(&participants);
        assert_eq!(
            emotions(&ranked),
            vec![
                Emotion::Disengaged,
                Emotion::Confused,
                Emotion::Bored,
                Emotion::Focused
            ]
        );
    }

    #[test]
    fn ties_keep_roster_order() {
        let participants = roster(&[
            ("first", Emotion::Confused),
            ("calm", Emotion::Focused),
            ("second", Emotion::Confused),
            ("third", Emotion::Distracted),
        ]);
        let ids: Vec<String> = rank_participants(&participants)
            .into_iter()
            .map(|entry| entry.participant.id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third", "calm"]);
    }

    #[test]
    fn ranking_does_not_reorder_roster() {
        let participants = roster(&[("a", Emotion::Focused), ("b", Emotion::Disengaged)]);
        let before = participants.clone();
        let _ = rank_participants(&participants);
        assert_eq!(participants, before);
    }
}
