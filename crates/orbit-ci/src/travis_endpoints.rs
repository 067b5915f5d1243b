use orbit_plan::{Instruction, TargetSystem};

pub const DEFAULT_TRAVIS_API_BASE: &str = "https://api.travis-ci.org";
const TRAVIS_MEDIA_TYPE: &str = "application/vnd.travis-ci.2+json";
const TRAVIS_USER_AGENT: &str = "orbit/0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravisEndpoints {
    api_base: String,
}

impl Default for TravisEndpoints {
    fn default() -> Self {
        Self::new(DEFAULT_TRAVIS_API_BASE)
    }
}

impl TravisEndpoints {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn build_url(&self, build_id: &str) -> String {
        format!("{}/builds/{build_id}", self.api_base)
    }

    pub fn job_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{job_id}", self.api_base)
    }

    pub fn fetch_build(&self, build_id: &str) -> Instruction {
        Self::request(self.build_url(build_id))
    }

    pub fn fetch_job(&self, job_id: &str) -> Instruction {
        Self::request(self.job_url(job_id))
    }

    // Public repos need no token on the v2 API.
    fn request(url: String) -> Instruction {
        Instruction::get(TargetSystem::Ci, url)
            .with_header("Accept", TRAVIS_MEDIA_TYPE)
            .with_header("Content-Type", TRAVIS_MEDIA_TYPE)
            .with_header("User-Agent", TRAVIS_USER_AGENT)
    }
}
