// Prompt sent to the oracle for one pair of comments.

/// Build the similarity prompt. Both comments are embedded verbatim.
pub fn build_prompt(comment_a: &str, comment_b: &str) -> String {
    format!(
        "You are an AI that compares two transaction comments and returns a similarity percentage from 0 to 100.\n\
         \n\
         Comment 1: \"{comment_a}\"\n\
         Comment 2: \"{comment_b}\"\n\
         \n\
         How similar are these two, considering they could be partial payments, future settlements, or recurring transfers?\n\
         \n\
         Respond with only a number from 0 to 100, no extra text or punctuation."
    )
}
