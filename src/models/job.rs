use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One open role pulled out of a careers page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub experience: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

impl JobPosting {
    pub fn display_role(&self) -> &str {
        match self.role.trim() {
            "" => "Unknown Role",
            role => role,
        }
    }
}

/// Shape of the extraction model's answer: either a JSON array of postings or
/// a single bare posting object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExtractedJobs {
    Many(Vec<JobPosting>),
    One(JobPosting),
}

impl ExtractedJobs {
    /// A bare object becomes a one-element list.
    pub fn into_vec(self) -> Vec<JobPosting> {
        match self {
            ExtractedJobs::Many(jobs) => jobs,
            ExtractedJobs::One(job) => vec![job],
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

// Models sometimes answer `"skills": "Python, SQL"` instead of an array.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_string(other)],
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_becomes_single_posting() {
        let parsed: ExtractedJobs = serde_json::from_str(
            r#"{"role":"Backend Engineer","experience":"3+ years","skills":["Python"],"description":"APIs"}"#,
        )
        .unwrap();

        let jobs = parsed.into_vec();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].role, "Backend Engineer");
        assert_eq!(jobs[0].skills, vec!["Python"]);
    }

    #[test]
    fn array_keeps_model_order() {
        let parsed: ExtractedJobs =
            serde_json::from_str(r#"[{"role":"A"},{"role":"B"},{"role":"C"}]"#).unwrap();

        let roles: Vec<_> = parsed.into_vec().into_iter().map(|j| j.role).collect();
        assert_eq!(roles, vec!["A", "B", "C"]);
    }

    #[test]
    fn tolerates_loose_field_types() {
        let job: JobPosting = serde_json::from_str(
            r#"{"role":null,"experience":5,"skills":"Rust, Tokio ,, gRPC","description":["Build","ship"]}"#,
        )
        .unwrap();

        assert_eq!(job.role, "");
        assert_eq!(job.display_role(), "Unknown Role");
        assert_eq!(job.experience, "5");
        assert_eq!(job.skills, vec!["Rust", "Tokio", "gRPC"]);
        assert_eq!(job.description, "Build, ship");
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let job: JobPosting = serde_json::from_str("{}").unwrap();
        assert_eq!(job, JobPosting::default());
    }
}
