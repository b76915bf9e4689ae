//! Client statistics rows: backend aggregates left-joined with the client
//! master table.

use crate::query::{Searchable, SortKey, SortOrder, SortValue, Sortable};
use crate::rates::count_rate;
use outreach_backend::records::{ClientRecord, ClientStatsRecord};
use outreach_core::types::ClientStatRow;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientSortKey {
    #[default]
    ClientName,
    EmailsSent,
    Replies,
    ReplyRate,
    PositiveReplies,
    PositiveRate,
    BounceRate,
    UniqueLeads,
    OnboardingDate,
}

impl SortKey for ClientSortKey {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("client_name", ClientSortKey::ClientName),
        ("name", ClientSortKey::ClientName),
        ("emails_sent", ClientSortKey::EmailsSent),
        ("replies", ClientSortKey::Replies),
        ("reply_rate", ClientSortKey::ReplyRate),
        ("positive_replies", ClientSortKey::PositiveReplies),
        ("positive_rate", ClientSortKey::PositiveRate),
        ("bounce_rate", ClientSortKey::BounceRate),
        ("unique_leads", ClientSortKey::UniqueLeads),
        ("onboarding_date", ClientSortKey::OnboardingDate),
    ];

    fn default_order(self) -> SortOrder {
        match self {
            ClientSortKey::ClientName => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

impl Sortable for ClientStatRow {
    type Key = ClientSortKey;

    fn sort_value(&self, key: ClientSortKey) -> SortValue<'_> {
        match key {
            ClientSortKey::ClientName => SortValue::Text(&self.client_name),
            ClientSortKey::EmailsSent => SortValue::Number(self.emails_sent as f64),
            ClientSortKey::Replies => SortValue::Number(self.replies as f64),
            ClientSortKey::ReplyRate => SortValue::Number(self.reply_rate),
            ClientSortKey::PositiveReplies => SortValue::Number(self.positive_replies as f64),
            ClientSortKey::PositiveRate => SortValue::Number(self.positive_rate),
            ClientSortKey::BounceRate => SortValue::Number(self.bounce_rate),
            ClientSortKey::UniqueLeads => SortValue::Number(self.unique_leads as f64),
            ClientSortKey::OnboardingDate => SortValue::Date(self.onboarding_date),
        }
    }

    fn tie_breaker(&self) -> i64 {
        self.client_id
    }
}

impl Searchable for ClientStatRow {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            &self.client_name,
            &self.contact_name,
            &self.email,
            &self.industry,
        ]
    }
}

fn text(value: Option<&Option<String>>) -> String {
    value.and_then(|v| v.clone()).unwrap_or_default()
}

fn has_key(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

/// Build one row. Without `stats` every metric is zero; without `master`
/// the contact fields are blank and the name comes from the stats row.
pub fn client_row(
    client_id: i64,
    stats: Option<&ClientStatsRecord>,
    master: Option<&ClientRecord>,
) -> ClientStatRow {
    let client_name = master
        .map(|m| m.client_name.clone())
        .or_else(|| stats.and_then(|s| s.client_name.clone()))
        .unwrap_or_default();

    let (sent, replies, positive, bounces, leads) = stats.map_or((0, 0, 0, 0, 0), |s| {
        (
            s.emails_sent,
            s.replies,
            s.positive_replies,
            s.bounces,
            s.unique_leads,
        )
    });

    ClientStatRow {
        client_id,
        client_name,
        contact_name: text(master.map(|m| &m.contact_name)),
        email: text(master.map(|m| &m.email)),
        phone: text(master.map(|m| &m.phone)),
        industry: text(master.map(|m| &m.industry)),
        website: text(master.map(|m| &m.website)),
        has_instantly_key: master.is_some_and(|m| has_key(&m.instantly_api_key)),
        has_smartlead_key: master.is_some_and(|m| has_key(&m.smartlead_api_key)),
        emails_sent: sent,
        replies,
        reply_rate: count_rate(replies, sent),
        positive_replies: positive,
        positive_rate: count_rate(positive, replies),
        bounces,
        bounce_rate: count_rate(bounces, sent),
        unique_leads: leads,
        onboarding_date: stats
            .and_then(|s| s.onboarding_date)
            .or_else(|| master.and_then(|m| m.onboarding_date)),
        services: stats.and_then(|s| s.services.clone()).unwrap_or_default(),
    }
}

/// Left join: every stats row appears once, decorated with the master row
/// whose `id` equals its `client_id` when there is one.
pub fn merge_client_rows(
    stats: &[ClientStatsRecord],
    masters: &[ClientRecord],
) -> Vec<ClientStatRow> {
    let by_id: HashMap<i64, &ClientRecord> = masters.iter().map(|m| (m.id, m)).collect();
    stats
        .iter()
        .map(|s| client_row(s.client_id, Some(s), by_id.get(&s.client_id).copied()))
        .collect()
}
