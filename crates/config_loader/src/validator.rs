//! 配置校验模块
//!
//! 校验规则：
//! - timeout_ms > 0
//! - max_concurrency / max_items >= 1 (若设置)
//! - target url 非空且唯一
//! - targets 数量不超过 max_items
//! - request_timeout_ms > 0 (若设置)

use std::collections::HashSet;

use contracts::{ContractError, FanoutBlueprint};

/// 校验 FanoutBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    validate_dispatcher(blueprint)?;
    validate_http(blueprint)?;
    validate_targets(blueprint)?;
    Ok(())
}

/// 校验分发器配置
fn validate_dispatcher(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    let dispatcher = &blueprint.dispatcher;

    if dispatcher.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }

    if dispatcher.max_concurrency == Some(0) {
        return Err(ContractError::config_validation(
            "dispatcher.max_concurrency",
            "max_concurrency must be >= 1",
        ));
    }

    if dispatcher.max_items == Some(0) {
        return Err(ContractError::config_validation(
            "dispatcher.max_items",
            "max_items must be >= 1",
        ));
    }

    Ok(())
}

/// 校验 HTTP 配置
fn validate_http(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    if blueprint.http.request_timeout_ms == Some(0) {
        return Err(ContractError::config_validation(
            "http.request_timeout_ms",
            "request_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验目标列表
fn validate_targets(blueprint: &FanoutBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, target) in blueprint.targets.iter().enumerate() {
        if target.url.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("targets[{}].url", idx),
                "target url cannot be empty",
            ));
        }
        if !seen.insert(target.url.as_str()) {
            return Err(ContractError::config_validation(
                format!("targets[{}].url", idx),
                format!("duplicate target url '{}'", target.url),
            ));
        }
    }

    if let Some(max) = blueprint.dispatcher.max_items {
        if blueprint.targets.len() > max {
            return Err(ContractError::config_validation(
                "targets",
                format!(
                    "{} targets exceed dispatcher.max_items ({})",
                    blueprint.targets.len(),
                    max
                ),
            ));
        }
    }

    Ok(())
}
