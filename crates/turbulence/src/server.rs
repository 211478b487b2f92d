//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the divergence computation over stdio so assistants and dashboard
//! tooling can compare two distributions without shelling out to the CLI.
//!
//! # Architecture
//!
//! The MCP server is a presentation layer. It wraps the same core library the
//! CLI commands use; each `#[tool]` method delegates to `turbulence_core`
//! and only handles parameter defaults and error mapping. Nothing is cached
//! between calls.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use turbulence_core::{
    CompareOptions, DaySnapshot, DivergenceError, RankedToken, StopwordSet, TieMethod,
    TokenDistribution, TokenSeries, compare, rank_distribution, token_series,
};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `rank_turbulence_divergence` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DivergenceParams {
    /// Distribution for the first date.
    pub x1: TokenDistribution,
    /// Distribution for the second date.
    pub x2: TokenDistribution,
    /// Rank exponent, > 0. Defaults to the configured value.
    pub alpha: Option<f64>,
    /// Hot words per side. Defaults to the configured value.
    pub top_k: Option<usize>,
    /// Tie handling: "average" or "ordinal".
    pub tie_method: Option<TieMethod>,
    /// Extra stopwords for this call only.
    #[serde(default)]
    pub stopwords: Vec<String>,
    /// Ignore the server's configured stopwords.
    #[serde(default)]
    pub no_default_stopwords: bool,
}

/// Parameters for the `rank_distribution` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct RankDistributionParams {
    /// Distribution to rank.
    pub distribution: TokenDistribution,
    /// Tie handling: "average" or "ordinal".
    pub tie_method: Option<TieMethod>,
    /// Return at most this many rows.
    pub limit: Option<usize>,
}

/// One date's distribution for the `token_series` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DatedDistribution {
    /// Date label; series are ordered by it.
    pub date: String,
    /// Tokens observed on that date.
    pub distribution: TokenDistribution,
}

/// Parameters for the `token_series` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TokenSeriesParams {
    /// Tokens to follow.
    pub tokens: Vec<String>,
    /// One distribution per date, in any order.
    pub days: Vec<DatedDistribution>,
    /// Tie handling: "average" or "ordinal".
    pub tie_method: Option<TieMethod>,
}

#[derive(Serialize)]
struct SeriesTable {
    tie_method: TieMethod,
    series: Vec<TokenSeries>,
}

#[derive(Serialize)]
struct RankTable {
    tie_method: TieMethod,
    total: usize,
    rows: Vec<RankedToken>,
}

/// MCP server exposing rank turbulence divergence.
///
/// Holds the configured defaults and the stopword set; both are immutable
/// after startup.
#[derive(Clone)]
pub struct TurbulenceServer {
    defaults: CompareOptions,
    stopwords: Arc<StopwordSet>,
    max_input: Option<usize>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl Default for TurbulenceServer {
    fn default() -> Self {
        Self::new(CompareOptions::default(), StopwordSet::empty(), None)
    }
}

#[tool_router]
impl TurbulenceServer {
    /// Create a server with the given defaults.
    ///
    /// `max_input` caps the summed byte length of the tokens a single call
    /// may submit.
    pub fn new(defaults: CompareOptions, stopwords: StopwordSet, max_input: Option<usize>) -> Self {
        Self {
            defaults,
            stopwords: Arc::new(stopwords),
            max_input,
            tool_router: Self::tool_router(),
        }
    }

    /// Get project information.
    #[tool(description = "Get project name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = "get_info", format = %params.format, "executing MCP tool");

        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "defaults": {
                "alpha": self.defaults.alpha,
                "top_k": self.defaults.top_k,
                "tie_method": self.defaults.tie_method,
                "stopwords": self.stopwords.len(),
            },
        });

        let text = if params.format == "json" {
            to_json(&info)?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };

        tracing::info!(tool = "get_info", "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// Compare two distributions.
    #[tool(
        description = "Compare two token distributions (ranked_list, raw_occurrences or count_map) with rank turbulence divergence. Returns the normalized divergence and weighted hot words for each side."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn rank_turbulence_divergence(
        &self,
        Parameters(params): Parameters<DivergenceParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "rank_turbulence_divergence",
            n1 = params.x1.len(),
            n2 = params.x2.len(),
            "executing MCP tool"
        );
        self.check_size(&[&params.x1, &params.x2])?;

        let options = CompareOptions {
            alpha: params.alpha.unwrap_or(self.defaults.alpha),
            top_k: params.top_k.unwrap_or(self.defaults.top_k),
            tie_method: params.tie_method.unwrap_or(self.defaults.tie_method),
        };

        let report = if params.stopwords.is_empty() && !params.no_default_stopwords {
            compare(&params.x1, &params.x2, &options, &self.stopwords)
        } else {
            let mut stopwords = if params.no_default_stopwords {
                StopwordSet::empty()
            } else {
                StopwordSet::clone(&self.stopwords)
            };
            stopwords.extend(params.stopwords);
            compare(&params.x1, &params.x2, &options, &stopwords)
        }
        .map_err(divergence_error)?;

        let json = to_json(&report)?;
        tracing::info!(
            tool = "rank_turbulence_divergence",
            divergence = report.divergence,
            "MCP tool completed"
        );
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Rank a single distribution.
    #[tool(
        description = "Rank one token distribution by count (1 = most frequent). Ties share the average rank unless tie_method is ordinal."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn rank_distribution(
        &self,
        Parameters(params): Parameters<RankDistributionParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "rank_distribution",
            tokens = params.distribution.len(),
            "executing MCP tool"
        );
        self.check_size(&[&params.distribution])?;

        let tie_method = params.tie_method.unwrap_or(self.defaults.tie_method);
        let ranks = rank_distribution(&params.distribution, tie_method);
        let mut rows = ranks.table();
        let total = rows.len();
        if let Some(limit) = params.limit {
            rows.truncate(limit);
        }

        let json = to_json(&RankTable {
            tie_method,
            total,
            rows,
        })?;
        tracing::info!(tool = "rank_distribution", total, "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    /// Follow tokens across dated distributions.
    #[tool(
        description = "Follow tokens across dated distributions. Returns, per token, the count, rank and relative frequency on every date it was observed, ordered by date label; tokens never observed get an empty series."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn token_series(
        &self,
        Parameters(params): Parameters<TokenSeriesParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            tool = "token_series",
            days = params.days.len(),
            tokens = params.tokens.len(),
            "executing MCP tool"
        );
        let inputs: Vec<&TokenDistribution> =
            params.days.iter().map(|day| &day.distribution).collect();
        self.check_size(&inputs)?;

        let tie_method = params.tie_method.unwrap_or(self.defaults.tie_method);
        let days: Vec<DaySnapshot> = params
            .days
            .iter()
            .map(|day| {
                DaySnapshot::from_distribution(day.date.as_str(), &day.distribution, tie_method)
            })
            .collect();
        let series = token_series(&days, &params.tokens);

        let json = to_json(&SeriesTable { tie_method, series })?;
        tracing::info!(tool = "token_series", days = days.len(), "MCP tool completed");
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    fn check_size(&self, inputs: &[&TokenDistribution]) -> Result<(), McpError> {
        let Some(limit) = self.max_input else {
            return Ok(());
        };
        let size: usize = inputs.iter().map(|x| payload_bytes(x)).sum();
        if size > limit {
            return Err(McpError::invalid_params(
                format!("input too large: {size} bytes of tokens (limit: {limit} bytes)"),
                None,
            ));
        }
        Ok(())
    }
}

fn payload_bytes(x: &TokenDistribution) -> usize {
    match x {
        TokenDistribution::RankedList(tokens) | TokenDistribution::RawOccurrences(tokens) => {
            tokens.iter().map(String::len).sum()
        }
        TokenDistribution::CountMap(counts) => counts.keys().map(String::len).sum(),
    }
}

fn divergence_error(err: DivergenceError) -> McpError {
    match err {
        DivergenceError::InvalidAlpha(_) => McpError::invalid_params(err.to_string(), None),
        DivergenceError::DomainMismatch { .. } => McpError::internal_error(err.to_string(), None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization error: {e}"), None))
}

#[tool_handler]
impl ServerHandler for TurbulenceServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Compare two dated token distributions with rank_turbulence_divergence; inspect one with rank_distribution; follow words over time with token_series.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use rmcp::model::RawContent;

    fn ranked(tokens: &[&str]) -> TokenDistribution {
        TokenDistribution::RankedList(tokens.iter().map(|t| (*t).to_string()).collect())
    }

    fn counts(pairs: &[(&str, u64)]) -> TokenDistribution {
        TokenDistribution::CountMap(
            pairs
                .iter()
                .map(|(t, c)| ((*t).to_string(), *c))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn divergence_params(x1: TokenDistribution, x2: TokenDistribution) -> DivergenceParams {
        DivergenceParams {
            x1,
            x2,
            alpha: None,
            top_k: None,
            tie_method: None,
            stopwords: Vec::new(),
            no_default_stopwords: false,
        }
    }

    /// Extract text from the first content item in a `CallToolResult`.
    fn extract_text(result: &CallToolResult) -> Option<&str> {
        result.content.first().and_then(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
    }

    fn json_of(result: &CallToolResult) -> serde_json::Value {
        let text = extract_text(result).expect("should have text content");
        serde_json::from_str(text).expect("output should be valid JSON")
    }

    #[test]
    fn server_info_has_correct_name() {
        let server = TurbulenceServer::default();
        let info = ServerHandler::get_info(&server);

        assert_eq!(info.server_info.name, env!("CARGO_PKG_NAME"));
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn server_has_tools_capability() {
        let server = TurbulenceServer::default();
        let info = ServerHandler::get_info(&server);

        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn server_has_instructions() {
        let server = TurbulenceServer::default();
        let info = ServerHandler::get_info(&server);

        let instructions = info.instructions.expect("server should have instructions");
        assert!(instructions.contains(env!("CARGO_PKG_NAME")));
        assert!(instructions.contains("rank_turbulence_divergence"));
    }

    #[test]
    fn get_info_tool_returns_text_by_default() {
        let server = TurbulenceServer::default();
        let params = Parameters(GetInfoParams {
            format: "text".to_string(),
        });

        let result = server.get_info(params).expect("get_info should succeed");
        assert!(!result.is_error.unwrap_or(false));

        let text = extract_text(&result).expect("should have text content");
        assert!(text.contains(env!("CARGO_PKG_NAME")));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn get_info_tool_returns_json_with_defaults() {
        let server = TurbulenceServer::default();
        let params = Parameters(GetInfoParams {
            format: "json".to_string(),
        });

        let result = server.get_info(params).expect("get_info should succeed");
        let json = json_of(&result);

        assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(json["defaults"]["top_k"], 30);
        assert_eq!(json["defaults"]["tie_method"], "average");
    }

    #[test]
    fn divergence_tool_reports_both_sides() {
        let server = TurbulenceServer::default();
        let params = Parameters(divergence_params(
            counts(&[("mary", 6), ("jane", 3), ("chelsea", 2), ("ann", 1)]),
            counts(&[("ann", 5), ("jane", 4), ("barb", 2), ("crystal", 1)]),
        ));

        let result = server
            .rank_turbulence_divergence(params)
            .expect("tool should succeed");
        assert!(!result.is_error.unwrap_or(false));

        let json = json_of(&result);
        let d = json["divergence"].as_f64().unwrap();
        assert!(d > 0.0 && d <= 1.0);
        assert!(!json["side1"].as_array().unwrap().is_empty());
        assert!(!json["side2"].as_array().unwrap().is_empty());
        assert_eq!(json["vocabulary"], 6);
    }

    #[test]
    fn divergence_tool_applies_configured_stopwords() {
        let server = TurbulenceServer::new(
            CompareOptions::default(),
            StopwordSet::from_list(["barb"]),
            None,
        );
        let x1 = ranked(&["mary", "jane"]);
        let x2 = ranked(&["barb", "jane"]);

        let result = server
            .rank_turbulence_divergence(Parameters(divergence_params(x1.clone(), x2.clone())))
            .unwrap();
        let text = extract_text(&result).unwrap().to_string();
        assert!(!text.contains("\"barb\""));

        let mut params = divergence_params(x1, x2);
        params.no_default_stopwords = true;
        let result = server.rank_turbulence_divergence(Parameters(params)).unwrap();
        assert!(extract_text(&result).unwrap().contains("\"barb\""));
    }

    #[test]
    fn divergence_tool_accepts_call_stopwords() {
        let server = TurbulenceServer::default();
        let mut params = divergence_params(ranked(&["mary", "jane"]), ranked(&["barb", "jane"]));
        params.stopwords = vec!["mary".to_string()];

        let result = server.rank_turbulence_divergence(Parameters(params)).unwrap();
        assert!(!extract_text(&result).unwrap().contains("\"mary\""));
    }

    #[test]
    fn divergence_tool_rejects_bad_alpha() {
        let server = TurbulenceServer::default();
        let mut params = divergence_params(ranked(&["a"]), ranked(&["b"]));
        params.alpha = Some(-1.0);

        let err = server
            .rank_turbulence_divergence(Parameters(params))
            .unwrap_err();
        assert!(err.message.contains("alpha"));
    }

    #[test]
    fn divergence_tool_enforces_input_limit() {
        let server = TurbulenceServer::new(CompareOptions::default(), StopwordSet::empty(), Some(4));
        let params = divergence_params(ranked(&["long", "tokens"]), ranked(&["here"]));

        let err = server
            .rank_turbulence_divergence(Parameters(params))
            .unwrap_err();
        assert!(err.message.contains("input too large"));
    }

    #[test]
    fn rank_tool_returns_table() {
        let server = TurbulenceServer::default();
        let params = Parameters(RankDistributionParams {
            distribution: counts(&[("a", 5), ("b", 5), ("c", 1)]),
            tie_method: None,
            limit: Some(2),
        });

        let result = server.rank_distribution(params).unwrap();
        let json = json_of(&result);
        assert_eq!(json["total"], 3);
        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["rank"], 1.5);
        assert_eq!(rows[1]["rank"], 1.5);
    }

    #[test]
    fn series_tool_orders_dates_and_marks_missing_tokens() {
        let server = TurbulenceServer::default();
        let params: TokenSeriesParams = serde_json::from_value(serde_json::json!({
            "tokens": ["mary", "barb"],
            "days": [
                {"date": "2008-01-02", "distribution": {"shape": "count_map", "tokens": {"jane": 4, "mary": 1}}},
                {"date": "2008-01-01", "distribution": {"shape": "count_map", "tokens": {"mary": 6, "jane": 3}}}
            ]
        }))
        .unwrap();

        let result = server.token_series(Parameters(params)).unwrap();
        let json = json_of(&result);
        let series = json["series"].as_array().unwrap();
        let mary = series[0]["points"].as_array().unwrap();
        assert_eq!(mary.len(), 2);
        assert_eq!(mary[0]["date"], "2008-01-01");
        assert_eq!(mary[0]["rank"], 1.0);
        assert_eq!(mary[1]["rank"], 2.0);
        assert_eq!(mary[1]["count"], 1);
        assert!(series[1]["points"].as_array().unwrap().is_empty());
    }

    #[test]
    fn series_tool_enforces_input_limit() {
        let server = TurbulenceServer::new(CompareOptions::default(), StopwordSet::empty(), Some(4));
        let params = TokenSeriesParams {
            tokens: vec!["mary".to_string()],
            days: vec![
                DatedDistribution {
                    date: "d1".to_string(),
                    distribution: ranked(&["mary"]),
                },
                DatedDistribution {
                    date: "d2".to_string(),
                    distribution: ranked(&["jane"]),
                },
            ],
            tie_method: None,
        };

        let err = server.token_series(Parameters(params)).unwrap_err();
        assert!(err.message.contains("input too large"));
    }

    #[test]
    fn params_deserialize_from_tagged_json() {
        let params: DivergenceParams = serde_json::from_value(serde_json::json!({
            "x1": {"shape": "ranked_list", "tokens": ["a", "b"]},
            "x2": {"shape": "count_map", "tokens": {"a": 1, "c": 4}},
            "alpha": 0.5
        }))
        .unwrap();
        assert!(matches!(params.x1, TokenDistribution::RankedList(_)));
        assert!(matches!(params.x2, TokenDistribution::CountMap(_)));
        assert!(params.stopwords.is_empty());
    }
}
