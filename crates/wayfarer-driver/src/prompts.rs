// Prompt text sent to the chat model

/// System prompt for a navigating assistant
pub fn system_prompt(company: &str) -> String {
    format!(
        "\nYou are a chatbot assistant.\n\
         The user visited the website of a company \"{company}\", which is a Korean IT startup.\n\
         Your goal is to navigate the user through the chatbot by choosing the right node to follow based on the user's intent.\n\
         Don't answer with arbitrary response; you must answer only with the nodes of the chatbot, summoning human agents, or exit.\n\
         Try **not** to summon human agents if possible. You can exit if the user seems satisfied.\n"
    )
}

/// System prompt asking the model to role-play a user with one intent
pub fn intent_system_prompt(company: &str, chatbot_name: &str) -> String {
    format!(
        "\nAssume that you are a user of a chatbot.\n\
         The chatbot is at the homepage of the Korean IT startup \"{company}\".\n\
         Have conversation with the chatbot.\n\
         Think of a **very** specific situation related to the chatbot's purpose, which can be inferred from name {chatbot_name}.\n\
         Be creative of a situation that is not too simple.\n\
         Assume korean users, so you should speak in Korean.\n\
         Express your intent in one sentence.\n"
    )
}

/// Greeting the chatbot opens the intent conversation with
pub fn chatbot_greeting(chatbot_name: &str) -> String {
    format!("Hello, I am a chatbot {chatbot_name}. How can I help you?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_company() {
        let prompt = system_prompt("Acme");
        assert!(prompt.contains("company \"Acme\""));
        assert!(prompt.contains("summoning human agents, or exit"));
    }

    #[test]
    fn test_intent_prompts() {
        let prompt = intent_system_prompt("채널톡", "jobs-homepage");
        assert!(prompt.contains("\"채널톡\""));
        assert!(prompt.contains("inferred from name jobs-homepage."));
        assert_eq!(
            chatbot_greeting("jobs-homepage"),
            "Hello, I am a chatbot jobs-homepage. How can I help you?"
        );
    }
}
