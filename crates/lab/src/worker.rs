//! Processes one lab job at a time: runs every requested test (PREOP as a
//! two-phase LAB1-then-LAB2 flow, everything else as a single acquire on its
//! routed lab), then routes the completion reply by the request's `sender`.

use std::sync::Arc;

use common::lab::{Lab, LabJob, TestKind};
use common::message::{ManagerFeedbackMsg, Sender, SurgeryMsg, TriageMsg};
use ipc::{clock, Bus};
use rand::Rng;

fn draw(min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Runs a single test to completion, returning `false` if a lab slot could
/// not be acquired (only happens under shutdown, since slot semaphores have
/// no other failure mode here).
fn run_test(bus: &Bus, test: TestKind) -> bool {
    let lab = &bus.config.lab;
    if test.is_preop() {
        let phase1 = draw(lab.lab1_min_duration, lab.lab1_max_duration);
        let permit = match bus.lab_queue.lab1_slots.acquire() {
            Some(p) => p,
            None => return false,
        };
        clock::wait_ticks(phase1, bus.config.time_unit_ms);
        drop(permit);

        let phase2 = draw(lab.lab2_min_duration, lab.lab2_max_duration);
        let permit = match bus.lab_queue.lab2_slots.acquire() {
            Some(p) => p,
            None => return false,
        };
        clock::wait_ticks(phase2, bus.config.time_unit_ms);
        drop(permit);
        return true;
    }

    match test.route() {
        [Lab::Lab1] => {
            let duration = draw(lab.lab1_min_duration, lab.lab1_max_duration);
            let permit = match bus.lab_queue.lab1_slots.acquire() {
                Some(p) => p,
                None => return false,
            };
            clock::wait_ticks(duration, bus.config.time_unit_ms);
            drop(permit);
            true
        }
        [Lab::Lab2] => {
            let duration = draw(lab.lab2_min_duration, lab.lab2_max_duration);
            let permit = match bus.lab_queue.lab2_slots.acquire() {
                Some(p) => p,
                None => return false,
            };
            clock::wait_ticks(duration, bus.config.time_unit_ms);
            drop(permit);
            true
        }
        _ => unreachable!("non-preop test routes to exactly one lab"),
    }
}

fn route_response(bus: &Bus, job: &LabJob) {
    match job.sender {
        Sender::Surgery => {
            bus.surgery_inbound.send(
                job.priority,
                SurgeryMsg::LabResultsReady { surgery_id: job.operation_id, operation_id: job.operation_id },
            );
        }
        Sender::Triage => {
            bus.triage_inbound.send(
                job.priority,
                TriageMsg::LabResultsReady { patient_id: job.patient_id.clone(), operation_id: job.operation_id },
            );
        }
        Sender::Manager => {
            bus.manager_feedback.send(
                job.priority,
                ManagerFeedbackMsg::LabResultsReady { operation_id: job.operation_id, tick: bus.clock.current() },
            );
        }
    }
}

pub fn run(bus: Arc<Bus>, queue: Arc<crate::internal_queue::InternalQueue>) {
    while let Some(job) = queue.pop_blocking() {
        if bus.control.should_stop() {
            break;
        }
        let mut completed = true;
        for test in &job.tests {
            if !run_test(&bus, *test) {
                completed = false;
                break;
            }
            bus.stats.lab_test_completed();
        }
        if completed {
            route_response(&bus, &job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_handles_degenerate_range() {
        assert_eq!(draw(3, 3), 3);
        assert_eq!(draw(3, 2), 3);
    }
}
