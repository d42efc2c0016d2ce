use super::phase::PhaseConfig;

/// Render the instructions for a tournament round.
///
/// Pure template expansion: one bullet per granted capability, in declaration order.
pub fn render(round_num: u32, config: &PhaseConfig) -> String {
    let mut prompt = format!(
        "# Numerai Tournament Round {round_num}\n\
         \n\
         You are competing in the Numerai tournament as a data scientist. Your goal is to:\n\
         1. Explore the available data\n\
         2. Develop and train predictive models\n\
         3. Manage your stake and risk\n\
         4. Submit predictions for evaluation\n\
         \n\
         ## Available Data\n"
    );

    for capability in config.enabled() {
        prompt.push_str("- ");
        prompt.push_str(capability.description());
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\n\
         ## Your Task\n\
         Analyze the data, develop models, and make strategic decisions for Round {round_num}.\n\
         Use the available tools to:\n\
         - Load and explore the Numerai data\n\
         - Develop predictive models\n\
         - Simulate submissions and manage risk\n\
         - Track your progress and learnings\n\
         \n\
         Begin your analysis and model development now.\n"
    ));

    prompt
}

/// Expected-outcome description for a round
pub fn target(round_num: u32) -> String {
    format!(
        "Successfully complete Round {} with data analysis, model development, and strategic decision-making.",
        round_num
    )
}
