use crate::core::errors::OutlineError;
use crate::outline::types::OutlineDocument;

const TASK: &str = "You are a Markdown document structure analyst.

[Task]
The document is supplied one segment at a time (current_chunk). Extract the NEW heading hierarchy that appears in this segment and build it as a tree.
Use the structure extracted so far (previous_structure) to keep the hierarchy continuous, but never repeat headings it already contains.

[Rules]
1. Only process new content in current_chunk. Do not repeat headings already present in previous_structure.
2. If the hierarchy continues from the previous segment (for example it ended at \"1.2\" and this segment starts at \"1.2.1\"), nest the new headings under the correct parent.
3. If the text contains a table of contents (\"目录\", \"Contents\", \"Table of Contents\", ...), store its raw text under \"detected_toc\" and keep it out of the heading tree.
4. The result must contain two parts:
   - \"detected_toc\": the raw text of the table of contents, if any;
   - \"new_structure\": the heading tree added by this segment, without duplicates.
5. Every node must have a \"children\" key, even when it is an empty object.
6. Keep headings in the order they appear in the text. Do not reorder.
7. Output strict JSON only, with no explanation, comments or extra text.

[Output format]
{
  \"detected_toc\": {
    \"raw_text\": \"raw table of contents text, or null\"
  },
  \"new_structure\": {
    \"Heading 1\": {
      \"children\": {
        \"Subheading 1\": {\"children\": {}},
        \"Subheading 2\": {\"children\": {}}
      }
    }
  }
}
";

const REQUIREMENTS: &str = "[Output requirements]
- Output valid JSON only.
- Do not add any explanation or extra words.
- The JSON must parse as-is.
";

/// Build the incremental structure-extraction prompt for one chunk.
///
/// `previous` is rendered as compact JSON, or `null` before the first chunk.
pub fn build_extraction_prompt(
    previous: Option<&OutlineDocument>,
    chunk: &str,
) -> Result<String, OutlineError> {
    let previous = match previous {
        Some(document) => serde_json::to_string(document).map_err(OutlineError::internal)?,
        None => "null".to_string(),
    };

    Ok(format!(
        "{TASK}\n[Input]\n=== previous_structure ===\n{previous}\n\n=== current_chunk ===\n{chunk}\n\n{REQUIREMENTS}"
    ))
}
