//! System prompts for backend agents and the master router

use netops_core::Backend;
use netops_llm::ToolDefinition;

const RESPONSE_FORMAT: &str = "\
If you cannot call tools natively, answer in exactly this format.

To use a tool:

Thought: Do I need to use a tool? Yes
Action: <one of the tool names above>
Action Input: <input for the tool>

You will then receive:

Observation: <result of the tool>

When you have the answer, or no tool is needed:

Thought: Do I need to use a tool? No
Final Answer: <your answer to the user>
";

/// System prompt for the agent driving `backend` with `tools`
pub fn backend_prompt(backend: Backend, tools: &[ToolDefinition]) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a network assistant for {}. Answer questions and carry out requests \
         using only the tools listed below. Report only what the tools actually returned.\n\n",
        backend.label()
    ));

    prompt.push_str("## Guidelines\n\n");
    for line in guidelines(backend) {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');

    push_tools(&mut prompt, tools);
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

fn guidelines(backend: Backend) -> &'static [&'static str] {
    match backend {
        Backend::IosXe => &[
            "If you are unsure whether a show command is valid, pass it to \
             check_supported_command_tool. When it resolves, its output is fetched for you; \
             do not run the command again.",
            "Only use run_show_command_tool with a complete command you are confident in.",
            "Never use output modifiers such as '|', include, exclude, begin or redirect. \
             They are rejected.",
            "Use learn_config_tool for the running configuration and learn_logging_tool \
             for recent logs.",
            "apply_configuration_tool takes configuration lines, one per line, without \
             'configure terminal' or 'end'.",
        ],
        Backend::Aci => &[
            "If there is any doubt about an API URL or name, pass it to \
             check_supported_url_tool. When it resolves, the data is fetched for you.",
            "Before creating an object, read an existing one of the same class with \
             get_aci_data_tool to learn the payload structure.",
            "To find the URL for a create, call check_supported_url_tool with intent \
             'create'; it returns the URL without fetching it.",
            "The payload for create_aci_data_tool must be a JSON object.",
            "Confirm destructive requests before calling delete_aci_data_tool.",
        ],
        Backend::Ise => &[
            "If there is any doubt about an API URL or name, pass it to \
             check_supported_url_tool. When it resolves, the data is fetched for you.",
            "Access to ISE is read only. Explain that changes are not possible when asked.",
            "Large collections are paged; pass page and page_size to get_ise_data_tool \
             to see more.",
        ],
    }
}

/// System prompt for the master router
pub fn router_prompt(delegates: &[ToolDefinition]) -> String {
    let mut prompt = String::from(
        "You are a network assistant that routes each request to the agent for the \
         right system. Pass the user's request, in plain words, to one of the agents \
         below and relay its answer. A request that spans systems may need more than \
         one agent.\n\n",
    );
    push_tools(&mut prompt, delegates);
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}

fn push_tools(prompt: &mut String, tools: &[ToolDefinition]) {
    prompt.push_str("## Tools\n\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    prompt.push_str(&format!("\nTool names: {}\n\n", names.join(", ")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_prompt_lists_tools() {
        let tools = vec![
            ToolDefinition::new("check_supported_url_tool", "Check a URL", json!({})),
            ToolDefinition::new("get_ise_data_tool", "Fetch data", json!({})),
        ];
        let prompt = backend_prompt(Backend::Ise, &tools);
        assert!(prompt.contains("Cisco ISE"));
        assert!(prompt.contains("- get_ise_data_tool: Fetch data"));
        assert!(prompt.contains("Tool names: check_supported_url_tool, get_ise_data_tool"));
        assert!(prompt.contains("read only"));
        assert!(prompt.contains("Final Answer:"));
    }

    #[test]
    fn test_ios_xe_prompt_forbids_modifiers() {
        let prompt = backend_prompt(Backend::IosXe, &[]);
        assert!(prompt.contains("Never use output modifiers"));
    }
}
