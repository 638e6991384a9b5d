//! Outstanding job bookkeeping.
//!
//! A job id enters the registry when its submission is acknowledged and
//! leaves it exactly once, when its terminal status is dispatched.

use std::collections::BTreeMap;

use crate::JobId;

/// What the registry remembers about an outstanding extraction job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTicket {
    pub server_handle: String,
    /// Language the batch was submitted with.
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyStatus {
    Submitted,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblySlot {
    pub job_id: JobId,
    pub status: AssemblyStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetiredTask {
    Extraction(ExtractionTicket),
    Assembly(AssemblySlot),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRegistry {
    extraction: BTreeMap<JobId, ExtractionTicket>,
    assembly: Option<AssemblySlot>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.extraction.is_empty() && self.assembly.is_none()
    }

    pub fn len(&self) -> usize {
        self.extraction.len() + usize::from(self.assembly.is_some())
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.extraction.contains_key(job_id)
            || self.assembly.as_ref().is_some_and(|slot| &slot.job_id == job_id)
    }

    pub fn has_handle(&self, server_handle: &str) -> bool {
        self.extraction
            .values()
            .any(|ticket| ticket.server_handle == server_handle)
    }

    /// Registers an extraction job. Returns false if the job id or the page
    /// handle already has an outstanding job.
    pub(crate) fn insert_extraction(&mut self, job_id: JobId, ticket: ExtractionTicket) -> bool {
        if self.contains(&job_id) || self.has_handle(&ticket.server_handle) {
            return false;
        }
        self.extraction.insert(job_id, ticket);
        true
    }

    pub fn assembly(&self) -> Option<&AssemblySlot> {
        self.assembly.as_ref()
    }

    /// Occupies the assembly slot. Returns false if it is already taken.
    pub(crate) fn occupy_assembly(&mut self, job_id: JobId) -> bool {
        if self.assembly.is_some() || self.extraction.contains_key(&job_id) {
            return false;
        }
        self.assembly = Some(AssemblySlot {
            job_id,
            status: AssemblyStatus::Submitted,
            message: String::new(),
        });
        true
    }

    /// Returns true if the slot changed.
    pub(crate) fn mark_assembly_running(&mut self, job_id: &JobId) -> bool {
        match self.assembly.as_mut() {
            Some(slot) if &slot.job_id == job_id && slot.status != AssemblyStatus::Running => {
                slot.status = AssemblyStatus::Running;
                slot.message = "Generating document…".to_string();
                true
            }
            _ => false,
        }
    }

    /// Removes a job from wherever it is held.
    pub(crate) fn retire(&mut self, job_id: &JobId) -> Option<RetiredTask> {
        if let Some(ticket) = self.extraction.remove(job_id) {
            return Some(RetiredTask::Extraction(ticket));
        }
        if self.assembly.as_ref().is_some_and(|slot| &slot.job_id == job_id) {
            return self.assembly.take().map(RetiredTask::Assembly);
        }
        None
    }

    /// Every outstanding job id: extraction jobs in id order, then the assembly job.
    pub fn outstanding(&self) -> Vec<JobId> {
        self.extraction
            .keys()
            .cloned()
            .chain(self.assembly.iter().map(|slot| slot.job_id.clone()))
            .collect()
    }
}
