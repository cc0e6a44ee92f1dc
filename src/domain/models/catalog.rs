//! Built-in agent catalog.
//!
//! The default registry contents used when no agents file is configured.
//! Ids and priorities are load-bearing: capability matching, queen election
//! and the control-channel tests all assume this exact catalog.

use super::agent::{AgentConfig, AgentTier, Capability};

/// The eight default agents spanning tiers 1-4.
pub fn builtin_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new(
            "project_supervisor_orchestrator",
            "Project Supervisor Orchestrator",
            AgentTier::Core,
        )
        .with_model("claude-opus-4")
        .with_priority(95)
        .with_capability(
            Capability::new(
                "Multi-step workflow management",
                "Manages complex workflows coordinating multiple agents",
            )
            .with_tool("task_decomposition")
            .with_tool("agent_coordination")
            .with_tool("quality_gates")
            .with_domain("orchestration")
            .with_domain("workflow_management")
            .with_pattern("democratic_decision")
            .with_pattern("sequential_handoff")
            .with_trigger("complex_multi_step")
            .with_trigger("agent_coordination_needed"),
        ),
        AgentConfig::new("research_orchestrator", "Research Orchestrator", AgentTier::Core)
            .with_model("claude-opus-4")
            .with_priority(90)
            .with_capability(
                Capability::new(
                    "Comprehensive research coordination",
                    "Coordinates multi-phase research projects",
                )
                .with_tool("research_planning")
                .with_tool("specialist_coordination")
                .with_tool("synthesis")
                .with_domain("research")
                .with_domain("analysis")
                .with_domain("synthesis")
                .with_pattern("specialist_handoff")
                .with_pattern("parallel_research")
                .with_trigger("research_project")
                .with_trigger("multi_source_analysis"),
            ),
        AgentConfig::new("context_manager", "Context Manager", AgentTier::Core)
            .with_priority(85)
            .with_capability(
                Capability::new(
                    "Cross-agent context preservation",
                    "Manages context across multiple agents and sessions",
                )
                .with_tool("context_preservation")
                .with_tool("memory_management")
                .with_tool("state_handoff")
                .with_domain("context_management")
                .with_domain("memory_systems")
                .with_pattern("context_continuity")
                .with_pattern("state_preservation")
                .with_trigger("context_exceeds_10k_tokens")
                .with_trigger("multi_session_task"),
            ),
        AgentConfig::new("ios_developer", "iOS Developer", AgentTier::Specialists)
            .with_priority(80)
            .with_capability(
                Capability::new(
                    "Native iOS development",
                    "Swift/SwiftUI development with native integrations",
                )
                .with_tool("swift")
                .with_tool("swiftui")
                .with_tool("xcode")
                .with_domain("ios")
                .with_domain("swift")
                .with_domain("mobile")
                .with_domain("apple_ecosystem")
                .with_pattern("mobile_team")
                .with_pattern("ui_backend_coordination")
                .with_trigger("ios_development")
                .with_trigger("mobile_app"),
            ),
        AgentConfig::new("backend_architect", "Backend Architect", AgentTier::Specialists)
            .with_priority(75)
            .with_capability(
                Capability::new(
                    "API and system architecture",
                    "RESTful APIs, microservices, database design",
                )
                .with_tool("api_design")
                .with_tool("database_modeling")
                .with_tool("system_architecture")
                .with_domain("backend")
                .with_domain("api")
                .with_domain("architecture")
                .with_domain("databases")
                .with_pattern("full_stack_coordination")
                .with_pattern("security_integration")
                .with_trigger("backend_development")
                .with_trigger("api_design"),
            ),
        AgentConfig::new("ai_engineer", "AI Engineer", AgentTier::Specialists)
            .with_model("claude-opus-4")
            .with_priority(85)
            .with_capability(
                Capability::new(
                    "LLM applications and RAG systems",
                    "AI-powered applications, prompt engineering, RAG",
                )
                .with_tool("llm_integration")
                .with_tool("rag_systems")
                .with_tool("prompt_engineering")
                .with_domain("ai")
                .with_domain("ml")
                .with_domain("llm")
                .with_domain("rag")
                .with_pattern("ai_ml_team")
                .with_pattern("research_integration")
                .with_trigger("ai_development")
                .with_trigger("llm_integration"),
            ),
        AgentConfig::new(
            "tree_analysis_specialist",
            "Tree Analysis Specialist",
            AgentTier::BusinessDomain,
        )
        .with_model("claude-opus-4")
        .with_priority(70)
        .with_capability(
            Capability::new(
                "AI-powered tree assessments",
                "Tree health analysis, AFISS assessments, TreeScore calculations",
            )
            .with_tool("tree_assessment")
            .with_tool("afiss_protocol")
            .with_tool("treescore_calculation")
            .with_domain("forestry")
            .with_domain("arboriculture")
            .with_domain("tree_assessment")
            .with_pattern("forestry_team")
            .with_pattern("business_integration")
            .with_trigger("tree_assessment")
            .with_trigger("forestry_analysis"),
        ),
        AgentConfig::new(
            "forestry_business_analyst",
            "Forestry Business Analyst",
            AgentTier::BusinessDomain,
        )
        .with_priority(65)
        .with_capability(
            Capability::new(
                "Forestry business operations",
                "PpH pricing, DOCS workflow, business optimization",
            )
            .with_tool("pph_calculations")
            .with_tool("docs_workflow")
            .with_tool("business_metrics")
            .with_domain("forestry_business")
            .with_domain("pricing")
            .with_domain("operations")
            .with_pattern("business_team")
            .with_pattern("pricing_optimization")
            .with_trigger("forestry_business")
            .with_trigger("pricing_strategy"),
        ),
    ]
}
