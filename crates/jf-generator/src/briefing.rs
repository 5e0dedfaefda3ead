use jf_core::{
    Archetype, Attachment, BriefingMessage, Client, Consequences, DelayedMessage, FailureOutcomes, NetworkCredential,
    Objective, Outcome,
};
use jf_infra::Infrastructure;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::payout::failure_penalty;

pub const SUCCESS_MESSAGE_DELAY_MS: i64 = 30_000;
pub const FAILURE_MESSAGE_DELAY_MS: i64 = 15_000;
pub const SUCCESS_REPUTATION: i32 = 1;
pub const FAILURE_REPUTATION: i32 = -1;

fn default_intros(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::Repair => &[
            "Some of our files at {client} have been corrupted and we cannot open them. We need them repaired.",
            "{client} had a bad night. Several files on our server are damaged and staff are stuck.",
        ],
        Archetype::Backup => &[
            "{client} has never had a proper offsite backup. We would like that fixed before something goes wrong.",
            "Our insurer insists {client} keeps a second copy of its working files. Please set one up.",
        ],
        Archetype::Transfer => &[
            "{client} is moving to new hardware and the old archive has to come across intact.",
            "We are retiring a server at {client}. Move the data to the new site and clear out the old copy.",
        ],
    }
}

/// Story context for an arc step. Empty for standalone jobs.
#[derive(Clone, Debug, Default)]
pub struct Narrative {
    pub intro: Option<String>,
    pub referral: Option<String>,
    /// `(sequence, total)` within the arc.
    pub part: Option<(u32, u32)>,
}

pub struct BriefingInput<'a> {
    pub client: &'a Client,
    pub title: &'a str,
    pub archetype: Archetype,
    pub infra: &'a Infrastructure,
    pub objectives: &'a [Objective],
    pub time_limit_minutes: Option<u32>,
    pub payout: i64,
    pub narrative: &'a Narrative,
}

/// Mail the player receives with the job: story, task list, pay, the deadline
/// if there is one, and one credential attachment per network.
pub fn build_briefing<R: Rng + ?Sized>(input: &BriefingInput<'_>, rng: &mut R) -> BriefingMessage {
    let intro = match &input.narrative.intro {
        Some(text) => text.clone(),
        None => default_intros(input.archetype)
            .choose(rng)
            .copied()
            .unwrap_or("{client} has work for you.")
            .replace("{client}", &input.client.name),
    };

    let mut body = String::new();
    if let Some(referral) = &input.narrative.referral {
        body.push_str(referral);
        body.push_str("\n\n");
    }
    body.push_str(&intro);
    body.push_str("\n\nWhat we need:\n");
    for o in input.objectives {
        body.push_str(&format!("- {}\n", o.description));
    }
    body.push_str(&format!("\nPayment: {} credits on completion.\n", input.payout));
    if let Some(minutes) = input.time_limit_minutes {
        body.push_str(&format!(
            "\nDEADLINE: you have {minutes} minutes from acceptance. Late work will not be paid.\n"
        ));
    }
    body.push_str("\nNetwork credentials are attached. Activate them to connect.\n");

    BriefingMessage {
        from: input.client.name.clone(),
        subject: input.title.to_string(),
        body,
        attachments: input
            .infra
            .networks
            .iter()
            .map(|n| Attachment::NetworkAddress(NetworkCredential::from(n)))
            .collect(),
    }
}

fn failure_message(client: &Client, subject: String, body: String) -> DelayedMessage {
    DelayedMessage {
        delay_ms: FAILURE_MESSAGE_DELAY_MS,
        from: client.name.clone(),
        subject,
        body,
        attachments: vec![],
    }
}

/// Payout plus reputation on success; a quarter of the payout and reputation
/// lost on failure, with one message per failure reason.
pub fn build_consequences(client: &Client, title: &str, payout: i64) -> Consequences {
    let penalty = failure_penalty(payout);
    let success = Outcome {
        credits: payout,
        reputation: SUCCESS_REPUTATION,
        messages: vec![DelayedMessage {
            delay_ms: SUCCESS_MESSAGE_DELAY_MS,
            from: client.name.clone(),
            subject: format!("Payment: {title}"),
            body: format!(
                "Thank you. Everything checks out on our side. Payment of {payout} credits is enclosed.\n\n{}",
                client.name
            ),
            attachments: vec![Attachment::Cheque { amount: payout }],
        }],
    };

    let failure = FailureOutcomes {
        credits: penalty,
        reputation: FAILURE_REPUTATION,
        deadline: failure_message(
            client,
            format!("Missed deadline: {title}"),
            format!(
                "The deadline passed and the work was not done. We have had to bring someone else in, and \
                 {} credits have been charged to cover the delay.",
                -penalty
            ),
        ),
        files_deleted: failure_message(
            client,
            format!("Data lost: {title}"),
            format!(
                "Files we needed are gone. We did not ask for anything to be deleted. {} credits have been \
                 charged for the damage and we will not be in touch again soon.",
                -penalty
            ),
        ),
        incomplete: failure_message(
            client,
            format!("Unfinished: {title}"),
            format!(
                "The job was left unfinished and we cannot use what was delivered. {} credits have been \
                 charged.",
                -penalty
            ),
        ),
    };

    Consequences { success, failure }
}
