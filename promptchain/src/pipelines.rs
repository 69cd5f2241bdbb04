//! Ready-made pipelines for the insurance and product workflows.

use std::sync::Arc;

use crate::{
    chain::{parse_step, LlmChain},
    error::PipelineError,
    llm::LanguageModel,
    parser::{JsonOutputParser, OutputParser, StructuredOutputParser},
    pipeline::Pipeline,
    prompt::ChatPromptTemplate,
    prompts,
    records::{ClaimDetails, EmailInfo, VacationInfo},
};

fn llm_step(
    model: &Arc<dyn LanguageModel>,
    name: &str,
    template: impl Into<ChatPromptTemplate>,
    output_key: &str,
) -> crate::pipeline::Step {
    LlmChain::new(model.clone(), template)
        .with_output_key(output_key)
        .into_step(name)
}

/// `email -> summary -> claim_type -> final_response`.
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn insurance_claim(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    Pipeline::builder()
        .input("email")
        .step(llm_step(
            model,
            "summarize",
            ChatPromptTemplate::from_template(prompts::EMAIL_SUMMARY),
            "summary",
        ))
        .step(llm_step(
            model,
            "classify",
            ChatPromptTemplate::from_template(prompts::CLAIM_TYPE),
            "claim_type",
        ))
        .step(llm_step(
            model,
            "respond",
            ChatPromptTemplate::from_template(prompts::CLAIM_RESPONSE),
            "final_response",
        ))
        .outputs(["summary", "claim_type", "final_response"])
        .build()
}

/// `review -> summary, key_points, categories -> response`.
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn product_review(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    Pipeline::builder()
        .input("review")
        .step(llm_step(
            model,
            "summarize",
            ChatPromptTemplate::from_template(prompts::REVIEW_SUMMARY),
            "summary",
        ))
        .step(llm_step(
            model,
            "key_points",
            ChatPromptTemplate::from_template(prompts::REVIEW_KEY_POINTS),
            "key_points",
        ))
        .step(llm_step(
            model,
            "categories",
            ChatPromptTemplate::from_template(prompts::REVIEW_CATEGORIES),
            "categories",
        ))
        .step(llm_step(
            model,
            "respond",
            ChatPromptTemplate::from_template(prompts::REVIEW_RESPONSE),
            "response",
        ))
        .outputs(["summary", "key_points", "categories", "response"])
        .build()
}

/// `product, audience -> description -> tagline`.
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn product_marketing(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    Pipeline::builder()
        .inputs(["product", "audience"])
        .step(llm_step(
            model,
            "describe",
            ChatPromptTemplate::from_template(prompts::PRODUCT_DESCRIPTION),
            "description",
        ))
        .step(llm_step(
            model,
            "tagline",
            ChatPromptTemplate::from_template(prompts::PRODUCT_TAGLINE),
            "tagline",
        ))
        .outputs(["description", "tagline"])
        .build()
}

fn extraction<P>(
    model: &Arc<dyn LanguageModel>,
    template: &str,
    parser: P,
    output_key: &str,
) -> Result<Pipeline, PipelineError>
where
    P: OutputParser + 'static,
    P::Output: serde::Serialize,
{
    let prompt = ChatPromptTemplate::from_template(template)
        .with_partial("format_instructions", parser.format_instructions());

    Pipeline::builder()
        .input("email")
        .step(llm_step(model, "extract", prompt, "raw_output"))
        .step(parse_step("parse", parser, "raw_output", output_key))
        .output(output_key)
        .build()
}

/// `email -> claim` where `claim` is a [`ClaimDetails`].
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn claim_extraction(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    extraction(
        model,
        prompts::CLAIM_EXTRACTION,
        StructuredOutputParser::from_response_schemas(ClaimDetails::response_schemas()),
        "claim",
    )
}

/// `email -> email_info` where `email_info` is an [`EmailInfo`].
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn email_extraction(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    extraction(
        model,
        prompts::EMAIL_EXTRACTION,
        JsonOutputParser::<EmailInfo>::new(),
        "email_info",
    )
}

/// `email -> vacation` where `vacation` is a [`VacationInfo`].
///
/// # Errors
///
/// Only fails if the step wiring is inconsistent.
pub fn vacation_extraction(model: &Arc<dyn LanguageModel>) -> Result<Pipeline, PipelineError> {
    extraction(
        model,
        prompts::VACATION_EXTRACTION,
        JsonOutputParser::<VacationInfo>::new(),
        "vacation",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use map_macro::map;
    use serde_json::json;

    #[tokio::test]
    async fn should_thread_claim_summary_into_later_prompts() {
        // Given
        let scripted = Arc::new(ScriptedModel::new([
            "A pipe burst and flooded the basement.",
            "flood",
            "Dear John, we are sorry to hear about the flood.",
        ]));
        let model: Arc<dyn LanguageModel> = scripted.clone();
        let pipeline = insurance_claim(&model).unwrap();

        // When
        let outputs = pipeline
            .run(map! { "email".to_owned() => json!("flood in basement") })
            .await
            .unwrap();

        // Then
        let prompts = scripted.prompts();
        assert!(prompts[0].ends_with("flood in basement"));
        assert!(prompts[1].ends_with("Summary: A pipe burst and flooded the basement."));
        assert!(prompts[2].contains("Claim Type: flood"));
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs["claim_type"], "flood");
    }

    #[tokio::test]
    async fn should_run_product_review_in_order() {
        // Given
        let scripted = Arc::new(ScriptedModel::new([
            "Battery is weak, screen is great.",
            "- battery lasts half a day\n- bright screen",
            "battery life, screen quality, customer service, price",
            "Thank you for your feedback!",
        ]));
        let model: Arc<dyn LanguageModel> = scripted.clone();
        let pipeline = product_review(&model).unwrap();

        // When
        let outputs = pipeline
            .run(map! { "review".to_owned() => json!("The battery lasts only half a day.") })
            .await
            .unwrap();

        // Then
        let prompts = scripted.prompts();
        assert!(prompts[3].contains("Key Points: - battery lasts half a day"));
        assert_eq!(outputs["response"], "Thank you for your feedback!");
        assert_eq!(outputs.len(), 4);
    }

    #[tokio::test]
    async fn should_require_product_and_audience() {
        // Given
        let model: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::new([]));
        let pipeline = product_marketing(&model).unwrap();

        // When
        let error = pipeline
            .run(map! { "product".to_owned() => json!("smart water bottle") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(error, PipelineError::MissingInput { ref key, .. } if key == "audience"));
    }

    #[tokio::test]
    async fn should_extract_claim_details() {
        // Given
        let scripted = Arc::new(ScriptedModel::new([
            "```json\n{\"storm_date\": \"July 12th\", \"location\": \"Austin, Texas\", \"policy_number\": \"H12345678TX\"}\n```",
        ]));
        let model: Arc<dyn LanguageModel> = scripted.clone();
        let pipeline = claim_extraction(&model).unwrap();

        // When
        let outputs = pipeline
            .run(map! { "email".to_owned() => json!("Storm damage to my roof.") })
            .await
            .unwrap();

        // Then
        let claim: ClaimDetails = serde_json::from_value(outputs["claim"].clone()).unwrap();
        assert_eq!(claim.policy_number, "H12345678TX");
        assert!(scripted.prompts()[0].contains("\"storm_date\": string"));
    }
}
