use intake_core::{AgentRegistry, Error, ModelClient, Persona};

const DEFAULT_PANEL: &[(&str, &str)] = &[
    ("project_analyst", "project analyst"),
    ("technical_expert", "technical expert"),
    ("business_consultant", "business consultant"),
];

const SPECIALIST_PANEL: &[(&str, &str)] = &[
    ("ui_ux_expert", "UI/UX expert"),
    ("backend_architect", "backend architect"),
    ("security_specialist", "security specialist"),
    ("data_scientist", "data scientist"),
];

/// Creates a registry with a project analyst, a technical expert and a
/// business consultant.
pub fn default_panel(
    model_client: ModelClient,
    temperature: Option<f32>,
) -> Result<AgentRegistry, Error> {
    panel(model_client, temperature, DEFAULT_PANEL)
}

/// Creates a registry of specialists: UI/UX, backend, security and data.
pub fn specialist_panel(
    model_client: ModelClient,
    temperature: Option<f32>,
) -> Result<AgentRegistry, Error> {
    panel(model_client, temperature, SPECIALIST_PANEL)
}

fn panel(
    model_client: ModelClient,
    temperature: Option<f32>,
    members: &[(&str, &str)],
) -> Result<AgentRegistry, Error> {
    let mut registry = AgentRegistry::new(model_client);
    if let Some(temperature) = temperature {
        registry = registry.with_temperature(temperature);
    }
    for (name, role) in members {
        registry.register(*name, Persona::new(*role))?;
    }
    Ok(registry)
}
