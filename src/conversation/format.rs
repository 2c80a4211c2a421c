//! ChatML rendering for tool-calling dialogues.

use super::types::{Conversation, Role, Turn};

const IM_START: &str = "<|im_start|>";
const IM_END: &str = "<|im_end|>";

fn system_block(system_prompt: &str, tools: &str) -> String {
    format!(
        "{IM_START}system
{system_prompt}

# Tools

You may call one or more functions to assist with the user query.

You are provided with function signatures within <tools></tools> XML tags:
<tools>
{tools}
</tools>

For each function call, return a json object with function name and arguments within <tool_call></tool_call> XML tags:
<tool_call>
{{\"name\": <function-name>, \"arguments\": <args-json-object>}}
</tool_call>
{IM_END}
"
    )
}

pub fn render_turn(turn: &Turn) -> String {
    let value = &turn.value;
    match turn.from {
        Role::Human => format!("{IM_START}user\n{value}{IM_END}\n"),
        Role::FunctionCall => {
            let mut segment = format!("{IM_START}assistant\n");
            if let Some(content) = turn.content.as_deref().filter(|c| !c.is_empty()) {
                segment.push_str(content);
                segment.push('\n');
            }
            segment.push_str(&format!("<tool_call>\n{value}\n</tool_call>{IM_END}\n"));
            segment
        }
        Role::Observation => {
            format!("{IM_START}user\n<tool_response>\n{value}\n</tool_response>{IM_END}\n")
        }
        Role::Gpt => format!("{IM_START}assistant\n{value}{IM_END}\n"),
    }
}

/// Full prompt: system block, every turn, then an open assistant turn.
pub fn render_chatml(conversation: &Conversation) -> String {
    let mut dialog = system_block(&conversation.system_prompt, &conversation.tools);
    for turn in &conversation.conversations {
        dialog.push_str(&render_turn(turn));
    }
    dialog.push_str(IM_START);
    dialog.push_str("assistant\n");
    dialog
}
