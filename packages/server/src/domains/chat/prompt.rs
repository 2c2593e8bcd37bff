use llm_client::Message;

use crate::domains::directory::Contact;

pub const SYSTEM_PROMPT: &str = "You are a calm, practical disaster-preparedness assistant. \
Help people stay safe before, during and after earthquakes, floods and other emergencies. \
Give short, concrete steps. If someone describes a life-threatening situation, tell them to \
call emergency services first. Do not invent phone numbers; only use the contacts provided.";

/// System prompt with matched directory contacts appended
pub fn system_prompt(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return SYSTEM_PROMPT.to_string();
    }

    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("\n\nRelevant emergency contacts:");
    for contact in contacts {
        prompt.push_str(&format!(
            "\n- {} ({}): {}",
            contact.name, contact.category, contact.phone
        ));
        if !contact.description.is_empty() {
            prompt.push_str(&format!(" - {}", contact.description));
        }
    }
    prompt
}

/// System turn, then history, then the new user turn
pub fn build_conversation(
    contacts: &[Contact],
    history: Vec<Message>,
    message: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt(contacts)));
    messages.extend(history);
    messages.push(Message::user(message));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::Role;

    fn contact(name: &str) -> Contact {
        Contact {
            name: name.to_string(),
            phone: "911".to_string(),
            category: "emergency".to_string(),
            region: None,
            description: "Life-threatening emergencies".to_string(),
            keywords: vec![],
        }
    }

    #[test]
    fn test_prompt_without_contacts() {
        assert_eq!(system_prompt(&[]), SYSTEM_PROMPT);
    }

    #[test]
    fn test_prompt_lists_contacts() {
        let prompt = system_prompt(&[contact("Emergency Services")]);
        assert!(prompt.contains("Relevant emergency contacts:"));
        assert!(prompt.contains("- Emergency Services (emergency): 911 - Life-threatening"));
    }

    #[test]
    fn test_conversation_order() {
        let messages = build_conversation(
            &[],
            vec![Message::user("hi"), Message::assistant("hello")],
            "is the shelter open?",
        );

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[3].content, "is the shelter open?");
    }
}
