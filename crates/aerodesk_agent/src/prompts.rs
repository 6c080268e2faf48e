use crate::simulation::{Speaker, TranscriptEntry};
use aerodesk_core::Message;

/// The word a simulated customer answers with once it has nothing to add.
pub const FINISHED: &str = "FINISHED";

pub struct CustomerPrompt;

impl CustomerPrompt {
    /// System prompt for the simulated customer.
    pub fn system(instructions: &str) -> String {
        format!(
            "You are a customer of an airline company. You are interacting with a customer support agent.\n{}\nIf you have nothing more to add to the conversation, you must respond only with a single word: \"{}\"",
            instructions.trim(),
            FINISHED
        )
    }

    /// The transcript as the customer model sees it: the support agent's
    /// lines become human turns and the customer's own lines agent turns.
    pub fn swapped_view(transcript: &[TranscriptEntry]) -> Vec<Message> {
        transcript
            .iter()
            .map(|entry| match entry.speaker {
                Speaker::Agent => Message::human(entry.text.clone()),
                Speaker::Customer => Message::agent(entry.text.clone(), Vec::new()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_instructions() {
        let prompt = CustomerPrompt::system("  Your name is Ada.  ");
        assert!(prompt.starts_with("You are a customer of an airline company."));
        assert!(prompt.contains("\nYour name is Ada.\n"));
        assert!(prompt.ends_with("\"FINISHED\""));
    }

    #[test]
    fn test_swapped_view() {
        let transcript = vec![
            TranscriptEntry::customer("I want a refund"),
            TranscriptEntry::agent("Which booking?"),
        ];
        let view = CustomerPrompt::swapped_view(&transcript);
        assert_eq!(view[0], Message::agent("I want a refund", Vec::new()));
        assert_eq!(view[1], Message::human("Which booking?"));
    }
}
