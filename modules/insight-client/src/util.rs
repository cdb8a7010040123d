/// Strip markdown code fences from a model reply.
///
/// The service frequently wraps JSON answers in ```json fences even when
/// the prompt asks for bare JSON.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
