//! Prompt templates for the planning and verification stages.

use crate::llm::client::ChatMessage;

const PLANNER_SYSTEM: &str = r#"You are a Planning Agent in an AI Operations Assistant system.
Your role is to analyze user tasks and create detailed execution plans.

Available Tools:
1. github - Search GitHub repositories, get repository details, stars, descriptions
   Parameters: query (search term), sort (stars/forks/updated), limit (max results 1-10)

2. weather - Get current weather for a city
   Parameters: city (city name), country_code (optional, e.g., US, UK, JP)

Rules:
- Break down complex tasks into sequential steps
- Each step must use exactly one tool
- Specify all required parameters for each tool
- Consider dependencies between steps
- Be efficient - minimize unnecessary steps

You must respond with valid JSON matching this exact schema:
{
    "task_summary": "brief description of what user wants",
    "reasoning": "why you chose this plan",
    "steps": [
        {
            "step_number": 1,
            "description": "what this step does",
            "tool": "github|weather",
            "parameters": {"key": "value"},
            "depends_on": []
        }
    ]
}"#;

const VERIFIER_SYSTEM: &str = r#"You are a Verification Agent in an AI Operations Assistant system.
Your role is to validate execution results and produce a final formatted response.

Responsibilities:
1. Check if all requested information was retrieved
2. Identify any missing or incomplete data
3. Assess the overall quality of results
4. Format a clear, structured final response for the user

You must respond with valid JSON matching this exact schema:
{
    "is_valid": true/false,
    "completeness_score": 0.0-1.0,
    "issues": ["list of problems found"],
    "suggestions": ["recommendations for improvement"],
    "final_output": {
        "summary": "brief summary",
        "data": {}
    },
    "formatted_response": "Human-readable formatted response"
}"#;

pub fn planner_messages(task: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PLANNER_SYSTEM),
        ChatMessage::user(format!(
            "Create an execution plan for this task:\n\n{task}\n\n\
             Respond with a valid JSON execution plan only. No additional text."
        )),
    ]
}

pub fn verifier_messages(task: &str, plan: &str, results: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(VERIFIER_SYSTEM),
        ChatMessage::user(format!(
            "Verify and format these execution results:\n\n\
             Original Task: {task}\n\n\
             Execution Plan:\n{plan}\n\n\
             Results:\n{results}\n\n\
             Validate the results and create a formatted final response. \
             Respond with valid JSON only."
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_messages_carry_task_text() {
        let messages = planner_messages("find rust repos");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("find rust repos"));
    }

    #[test]
    fn verifier_messages_embed_digests() {
        let messages = verifier_messages("task", "plan digest", "results digest");
        assert!(messages[1].content.contains("plan digest"));
        assert!(messages[1].content.contains("results digest"));
    }
}
