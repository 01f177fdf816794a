use async_graphql::{Context, InputObject, Object, Result as GqlResult, SimpleObject};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::application::dispatch::StoreAction;
use crate::core::tally::entry::{Entry, StoreEntry};
use crate::core::tally::summary::{TallySummary, summarize, tally_round};
use crate::shell::state::AppState;

#[derive(SimpleObject, Clone)]
pub struct GqlEntry {
    pub count: f64,
    /// RFC 3339, UTC.
    pub date: String,
}

impl From<Entry> for GqlEntry {
    fn from(entry: Entry) -> Self {
        Self {
            count: entry.count,
            date: entry.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

/// Averages are rounded to one decimal.
#[derive(SimpleObject, Clone)]
pub struct GqlSummary {
    pub total_today: f64,
    pub avg_7_days: f64,
    pub avg_30_days: f64,
    pub avg_this_week: f64,
    pub avg_this_month: f64,
    pub total: f64,
}

impl From<TallySummary> for GqlSummary {
    fn from(summary: TallySummary) -> Self {
        Self {
            total_today: tally_round(summary.total_today),
            avg_7_days: tally_round(summary.avg_7_days),
            avg_30_days: tally_round(summary.avg_30_days),
            avg_this_week: tally_round(summary.avg_this_week),
            avg_this_month: tally_round(summary.avg_this_month),
            total: tally_round(summary.total),
        }
    }
}

#[derive(InputObject)]
pub struct GqlEntryInput {
    pub tag: String,
    pub count: f64,
    pub date: String,
}

impl TryFrom<GqlEntryInput> for StoreEntry {
    type Error = async_graphql::Error;

    fn try_from(input: GqlEntryInput) -> Result<Self, Self::Error> {
        let date = DateTime::parse_from_rfc3339(&input.date)
            .map_err(|e| async_graphql::Error::new(format!("invalid date {}: {e}", input.date)))?
            .with_timezone(&Utc);
        Ok(StoreEntry::new(input.tag, input.count, date))
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn tags(&self, context: &Context<'_>) -> GqlResult<Vec<String>> {
        let state = context.data_unchecked::<AppState>();
        let tags = state
            .dispatcher
            .store()
            .request_tags()
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(tags)
    }

    async fn entries(&self, context: &Context<'_>, tag: String) -> GqlResult<Vec<GqlEntry>> {
        let state = context.data_unchecked::<AppState>();
        let entries = state
            .dispatcher
            .store()
            .request_by_tag(&tag)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn summary(&self, context: &Context<'_>, tag: String) -> GqlResult<GqlSummary> {
        let state = context.data_unchecked::<AppState>();
        let entries = state
            .dispatcher
            .store()
            .request_by_tag(&tag)
            .await
            .map_err(|e| async_graphql::Error::new(e.to_string()))?;
        Ok(summarize(&entries, Utc::now()).into())
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn write_entry(&self, context: &Context<'_>, entry: GqlEntryInput) -> GqlResult<bool> {
        let state = context.data_unchecked::<AppState>();
        state
            .dispatcher
            .dispatch(StoreAction::Write(entry.try_into()?));
        Ok(true)
    }

    async fn delete_entry(&self, context: &Context<'_>, entry: GqlEntryInput) -> GqlResult<bool> {
        let state = context.data_unchecked::<AppState>();
        state
            .dispatcher
            .dispatch(StoreAction::Delete(entry.try_into()?));
        Ok(true)
    }

    async fn update_entry(
        &self,
        context: &Context<'_>,
        old: GqlEntryInput,
        new: GqlEntryInput,
    ) -> GqlResult<bool> {
        let state = context.data_unchecked::<AppState>();
        state.dispatcher.dispatch(StoreAction::Update {
            old: old.try_into()?,
            new: new.try_into()?,
        });
        Ok(true)
    }

    async fn clear(&self, context: &Context<'_>) -> GqlResult<bool> {
        let state = context.data_unchecked::<AppState>();
        state.dispatcher.dispatch(StoreAction::Clear);
        Ok(true)
    }
}
