// ==========================================
// FuelEU 合规系统 - 命令行主入口
// ==========================================
// 用法: fueleu-compliance [--db <path>] <command> [args...]
// 输出: stdout 为 JSON；日志输出到 stderr
// 退出码: 0 成功 / 2 业务或校验错误（含参数错误）/ 1 内部错误
// ==========================================

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use fueleu_compliance::api::{map_api_error, ApiError, ApiResult};
use fueleu_compliance::app::{get_default_db_path, AppState};
use fueleu_compliance::domain::route::RouteFilter;
use fueleu_compliance::domain::types::{FuelType, VesselType};
use fueleu_compliance::logging;

const DEFAULT_ACTION_LIMIT: usize = 20;

/// 业务或校验错误的退出码
const EXIT_CLIENT_ERROR: u8 = 2;
/// 内部错误的退出码
const EXIT_INTERNAL_ERROR: u8 = 1;

/// FuelEU Maritime 合规余额、存储与联营命令行
#[derive(Debug, Parser)]
#[command(name = "fueleu-compliance")]
#[command(about = "FuelEU Maritime 合规余额计算、盈余存储与船舶联营", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite 数据库路径（缺省为应用数据目录）
    #[arg(long, global = true, env = "FUELEU_DB_PATH")]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 查询航线（可按船型/燃料/年度过滤）
    Routes {
        #[arg(long)]
        vessel: Option<VesselType>,
        #[arg(long)]
        fuel: Option<FuelType>,
        #[arg(long)]
        year: Option<i32>,
    },

    /// 设置基线航线（航线编号或ID）
    Baseline { route: String },

    /// 基线对比
    Compare,

    /// 计算并保存合规余额
    Cb { ship_id: String, year: i32 },

    /// 调整后合规余额（计入已动用存储）
    AdjustedCb { ship_id: String, year: i32 },

    /// 存入盈余
    Bank { ship_id: String, year: i32 },

    /// 动用存储抵扣赤字
    Apply {
        ship_id: String,
        year: i32,
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// 船舶年度存储记录
    Records { ship_id: String, year: i32 },

    /// 船舶存储汇总
    BankSummary { ship_id: String },

    /// 创建联营
    Pool {
        year: i32,
        #[arg(required = true, num_args = 2..)]
        members: Vec<String>,
    },

    /// 年度联营列表
    Pools { year: i32 },

    /// 年度合规记录
    Compliance { year: i32 },

    /// 船舶操作日志
    Actions {
        ship_id: String,
        #[arg(default_value_t = DEFAULT_ACTION_LIMIT)]
        limit: usize,
    },
}

fn main() -> ExitCode {
    // 参数错误由 clap 输出并以退出码 2 结束
    let cli = Cli::parse();
    logging::init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::from(EXIT_INTERNAL_ERROR)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", fueleu_compliance::APP_NAME, fueleu_compliance::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let state = AppState::new(db_path)
        .map_err(anyhow::Error::msg)
        .context("无法初始化AppState")?;

    let result = dispatch(&state, &cli.command);
    if let Err(err) = &result {
        if err.is_client_error() {
            tracing::warn!(code = err.code(), "命令失败: {}", err);
        } else {
            tracing::error!(code = err.code(), "命令失败: {}", err);
        }
    }

    let (output, code) = render(result)?;
    println!("{}", output);
    Ok(ExitCode::from(code))
}

fn dispatch(state: &AppState, command: &Command) -> ApiResult<JsonValue> {
    match command {
        Command::Routes { vessel, fuel, year } => {
            let filter = RouteFilter {
                vessel_type: *vessel,
                fuel_type: *fuel,
                year: *year,
            };
            to_json(state.route_api.get_routes(&filter)?)
        }
        Command::Baseline { route } => to_json(state.route_api.set_baseline(route)?),
        Command::Compare => to_json(state.route_api.get_comparison()?),
        Command::Cb { ship_id, year } => {
            to_json(state.compliance_api.get_compliance_balance(ship_id, *year)?)
        }
        Command::AdjustedCb { ship_id, year } => {
            to_json(state.compliance_api.get_adjusted_balance(ship_id, *year)?)
        }
        Command::Bank { ship_id, year } => to_json(state.banking_api.bank_surplus(ship_id, *year)?),
        Command::Apply {
            ship_id,
            year,
            amount,
        } => to_json(state.banking_api.apply_banked(ship_id, *year, *amount)?),
        Command::Records { ship_id, year } => {
            to_json(state.banking_api.get_banking_records(ship_id, *year)?)
        }
        Command::BankSummary { ship_id } => to_json(state.banking_api.get_bank_summary(ship_id)?),
        Command::Pool { year, members } => to_json(state.pool_api.create_pool(*year, members)?),
        Command::Pools { year } => to_json(state.pool_api.list_pools(*year)?),
        Command::Compliance { year } => {
            to_json(state.compliance_api.list_compliance_by_year(*year)?)
        }
        Command::Actions { ship_id, limit } => {
            to_json(state.list_actions_by_ship(ship_id, *limit)?)
        }
    }
}

/// 生成输出文本与退出码
///
/// # 返回
/// - 成功: `{"success":true,"data":...}`，退出码 0
/// - 失败: ErrorResponse JSON，客户端错误 2 / 内部错误 1
fn render(result: ApiResult<JsonValue>) -> anyhow::Result<(String, u8)> {
    match result {
        Ok(data) => {
            let out = json!({ "success": true, "data": data });
            Ok((serde_json::to_string_pretty(&out)?, 0))
        }
        Err(err) => Ok((map_api_error(&err), exit_code_for(&err))),
    }
}

fn exit_code_for(err: &ApiError) -> u8 {
    if err.is_client_error() {
        EXIT_CLIENT_ERROR
    } else {
        EXIT_INTERNAL_ERROR
    }
}

fn to_json<T: Serialize>(value: T) -> ApiResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(format!("序列化失败: {}", e)))
}
