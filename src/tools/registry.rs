use super::*;

/// Build a fresh tool set for one round of the given phase.
///
/// Data, scratchpad and key-value tools are always present; training and
/// submission come with phase 1, bankroll simulation with phase 2 and vector
/// memory with phase 4.
pub fn phase_tools(phase: u32) -> ToolSet {
    let mut tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(NumeraiDataTool),
        Arc::new(ScratchpadTool::default()),
        Arc::new(KvTool::default()),
    ];

    if phase >= 1 {
        tools.push(Arc::new(ModelTrainingTool));
        tools.push(Arc::new(SubmissionSimulatorTool));
    }

    if phase >= 2 {
        tools.push(Arc::new(BusinessSimTool::default()));
    }

    if phase >= 4 {
        tools.push(Arc::new(VectorMemoryTool::default()));
    }

    ToolSet::new(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_1_tools() {
        assert_eq!(
            phase_tools(1).names(),
            vec![
                "load_numerai_data",
                "write_note",
                "store_kv",
                "train_model",
                "simulate_submission"
            ]
        );
    }

    #[test]
    fn test_business_sim_from_phase_2() {
        assert!(phase_tools(1).get("update_bankroll").is_none());
        assert!(phase_tools(2).get("update_bankroll").is_some());
        assert!(phase_tools(3).get("store_memory").is_none());
    }

    #[test]
    fn test_phase_4_has_everything() {
        let tools = phase_tools(4);
        assert_eq!(tools.len(), 7);
        assert_eq!(tools.names().last(), Some(&"store_memory"));
    }

    #[tokio::test]
    async fn test_call_missing_tool_fails() {
        let err = phase_tools(1)
            .call("update_bankroll", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("update_bankroll"));
    }
}
