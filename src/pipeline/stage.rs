use crate::models::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Init,
    Fetch,
    Performance,
    Market,
    Scoring,
    Agenda,
    Generative,
    Enhanced,
}

impl StageName {
    /// Step name recorded in the job's event log.
    pub fn step(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Fetch => "FETCH",
            Self::Performance => "PERFORMANCE",
            Self::Market => "MARKET",
            Self::Scoring => "SCORING",
            Self::Agenda => "AGENDA",
            Self::Generative => "GENERATIVE",
            Self::Enhanced => "ENHANCED",
        }
    }

    /// Status persisted while the stage runs. The narrative step has none.
    pub fn status(self) -> Option<JobStatus> {
        match self {
            Self::Init => Some(JobStatus::Processing),
            Self::Fetch => Some(JobStatus::ProcessingFetch),
            Self::Performance => Some(JobStatus::ProcessingPerformance),
            Self::Market => Some(JobStatus::ProcessingMarket),
            Self::Scoring => Some(JobStatus::ProcessingScoring),
            Self::Agenda => Some(JobStatus::ProcessingAgenda),
            Self::Generative => Some(JobStatus::ProcessingGenerative),
            Self::Enhanced => None,
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.step())
    }
}

pub struct StageDefinition {
    pub name: StageName,
    pub display_name: &'static str,
    pub description: &'static str,
}

pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        name: StageName::Init,
        display_name: "Initialization",
        description: "Claim the job and mark it processing",
    },
    StageDefinition {
        name: StageName::Fetch,
        display_name: "Content Acquisition",
        description: "Remote scrape with local headless-browser fallback",
    },
    StageDefinition {
        name: StageName::Performance,
        display_name: "Performance",
        description: "PageSpeed Insights field and lab metrics",
    },
    StageDefinition {
        name: StageName::Market,
        display_name: "Market Analysis",
        description: "Business model, audience and competitors",
    },
    StageDefinition {
        name: StageName::Scoring,
        display_name: "Scored Evaluation",
        description: "Eight weighted GEO pillars and the overall score",
    },
    StageDefinition {
        name: StageName::Agenda,
        display_name: "Strategic Agenda",
        description: "Session focus, goals and customized questions",
    },
    StageDefinition {
        name: StageName::Generative,
        display_name: "Generative Performance",
        description: "Share of voice, citations, sentiment and claim accuracy",
    },
    StageDefinition {
        name: StageName::Enhanced,
        display_name: "Enhanced Narrative",
        description: "Best-effort executive narrative",
    },
];

pub fn display_name(stage: StageName) -> &'static str {
    STAGES
        .iter()
        .find(|s| s.name == stage)
        .map(|s| s.display_name)
        .unwrap_or("Unknown")
}
