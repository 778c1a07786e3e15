use crate::config::PARAGRAPH_MARKER;
use crate::types::GenerationRequest;

/// Build the prompt for a single essay.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "You are a student in grade {} at a well-renowned school. ",
        request.instructional_level
    ));
    prompt.push_str(&format!(
        "Write a {} essay in response to the prompt below.\n\n",
        request.prompt_type
    ));

    prompt.push_str(&format!("Prompt: {}\n", request.prompt_text));
    if let Some(ref editorial) = request.editorial_prompt {
        prompt.push_str(&format!("{editorial}\n"));
    }
    prompt.push('\n');

    prompt.push_str("Requirements:\n");
    prompt.push_str(&format!(
        "- The essay must contain exactly {} words.\n",
        request.target_word_count
    ));

    // Optional tone dimensions
    match request.sub_dimension {
        Some(ref sub) => prompt.push_str(&format!(
            "- The tone must be {} and {} only.\n",
            request.prompt_type, sub
        )),
        None => prompt.push_str(&format!("- The tone must be {} only.\n", request.prompt_type)),
    }
    if let Some(ref purpose) = request.purpose_org {
        prompt.push_str(&format!("- Some sentences should demonstrate {purpose}.\n"));
    }
    if let Some(ref dev) = request.dev_of_ideas {
        prompt.push_str(&format!("- Some sentences should show a pinch of {dev}.\n"));
    }
    if let Some(ref lang) = request.lang_conventions {
        prompt.push_str(&format!("- Pay particular attention to {lang}.\n"));
    }

    if request.error_count == 0 {
        prompt.push_str("- The essay must not contain any errors.\n");
    } else {
        prompt.push_str(&format!(
            "- Include exactly {} {} error{} and no other kind of error.\n",
            request.error_count,
            request.error_category,
            if request.error_count == 1 { "" } else { "s" }
        ));
    }

    prompt.push_str(&format!(
        "- Write plain paragraphs separated by the literal marker {PARAGRAPH_MARKER}.\n"
    ));

    prompt.push_str(
        "\nReturn ONLY the essay text. Do not add comments about the essay or the errors, \
         do not use markdown, headings or bullet points, and do not start with phrases \
         such as \"Here is\" or \"Sure\".",
    );

    prompt
}
