use tack_model::{ClaimedTask, Resolution};

/// URL layout of the queue service.
#[derive(Debug, Clone)]
pub struct Routes {
    root: String,
}

impl Routes {
    pub fn new(root_url: &str) -> Self {
        Self {
            root: root_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn claim_work(&self, provisioner_id: &str, worker_type: &str) -> String {
        format!("{}/claim-work/{provisioner_id}/{worker_type}", self.root)
    }

    pub fn reclaim(&self, task: &ClaimedTask) -> String {
        format!("{}/reclaim", self.run(task))
    }

    pub fn resolve(&self, task: &ClaimedTask, resolution: Resolution) -> String {
        format!("{}/{}", self.run(task), resolution.endpoint())
    }

    /// `relative` uses `/` separators regardless of host platform.
    pub fn artifact(&self, task: &ClaimedTask, relative: &str) -> String {
        format!("{}/artifacts/{relative}", self.run(task))
    }

    fn run(&self, task: &ClaimedTask) -> String {
        format!("{}/task/{}/runs/{}", self.root, task.task_id, task.run_id)
    }
}
