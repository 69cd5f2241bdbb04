use indoc::indoc;

pub const GREETING: &str = "How do you say good morning in {language}";

pub const REWRITE_REVIEW: &str = indoc! {"
    Please rewrite the following review in {tone}, and then
    translate the revised review into {language}.

    Review:
    '''{review}'''
"};

pub const CSV_CLAIM: &str = indoc! {"
    Extract the following details from the insurance claim email:
    - policy_number
    - date_of_incident
    - location
    - damage_description

    Format the output as csv

    Email:
    {email}
"};

pub const EMAIL_SUMMARY: &str = "Summarize the following email in 1-2 sentences:\n\n{email}";

pub const CLAIM_TYPE: &str = "Based on the summary, what type of insurance claim is this (e.g. fire, flood, theft, auto)?\n\nSummary: {summary}";

pub const CLAIM_RESPONSE: &str = indoc! {"
    You are an insurance agent. Write a professional response based on the following details:

    Summary: {summary}
    Claim Type: {claim_type}

    Your response:"};

pub const REVIEW_SUMMARY: &str = indoc! {"
    Summarize the following product review in 1-2 sentences:

    Review: {review}
    Summary:"};

pub const REVIEW_KEY_POINTS: &str = indoc! {"
    Extract the key points from this product review as bullet points:

    Review: {review}
    Key Points:"};

pub const REVIEW_CATEGORIES: &str = indoc! {"
    Identify relevant product features/categories mentioned in the review (e.g., battery life, screen quality, customer service, price, etc.):

    Review: {review}
    Categories:"};

pub const REVIEW_RESPONSE: &str = indoc! {"
    Write a helpful and polite response to the customer based on the following summary and key points:

    Summary: {summary}
    Key Points: {key_points}

    Response:"};

pub const PRODUCT_DESCRIPTION: &str =
    "Write a detailed product description for a {product} targeting {audience}.";

pub const PRODUCT_TAGLINE: &str =
    "Create a catchy marketing tagline based on the following product description:\n{description}";

pub const CLAIM_EXTRACTION: &str = indoc! {"
    From the following email, extract the following information:

    storm_date: The date when the storm occurred.
    location: The location (city and state) where the storm happened.
    policy_number: The policy number mentioned in the email.

    Return the result as JSON using the following keys:
    storm_date
    location
    policy_number

    email: {email}
    {format_instructions}
"};

pub const EMAIL_EXTRACTION: &str = indoc! {"
    Extract the following information from the email:

    - sender
    - subject
    - date
    - key_topics (as a list of keywords)

    Return the output in the format below:
    {format_instructions}

    email: {email}
"};

pub const VACATION_EXTRACTION: &str = indoc! {"
    From the following email, extract the following information regarding this trip:

    email: {email}

    {format_instructions}
"};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptTemplate;

    #[test]
    fn should_expose_expected_variables() {
        let cases: [(&str, &[&str]); 6] = [
            (REWRITE_REVIEW, &["tone", "language", "review"]),
            (CLAIM_RESPONSE, &["summary", "claim_type"]),
            (REVIEW_RESPONSE, &["summary", "key_points"]),
            (PRODUCT_DESCRIPTION, &["product", "audience"]),
            (CLAIM_EXTRACTION, &["email", "format_instructions"]),
            (EMAIL_EXTRACTION, &["format_instructions", "email"]),
        ];

        for (template, variables) in cases {
            assert_eq!(PromptTemplate::new(template).input_variables(), variables);
        }
    }
}
