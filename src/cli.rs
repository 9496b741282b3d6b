use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tracklabel")]
#[command(about = "从快递面单照片中识别运单号并回填到订单", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 数据库文件（覆盖配置）
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 识别面单照片并匹配订单
    Ingest {
        /// 图片文件或目录（目录只展开一层）
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 不询问，直接提交自动匹配结果
        #[arg(short, long)]
        yes: bool,
    },

    /// 搜索待发货订单（订单号或联系信息）
    Search {
        query: String,

        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// 手动设置订单运单号；省略运单号则清除
    Track {
        order_code: String,
        tracking: Option<String>,
    },

    /// 批量设置配送批次
    Round {
        /// 批次名称（默认今天的日期）
        #[arg(long, conflicts_with = "clear")]
        name: Option<String>,

        /// 清除批次
        #[arg(long)]
        clear: bool,

        #[arg(required = true)]
        order_codes: Vec<String>,
    },

    /// 列出订单
    Orders {
        /// 按状态过滤 (pending/processing/shipped/delivered/cancelled)
        #[arg(short, long)]
        status: Option<String>,

        /// 只显示未填运单号的订单
        #[arg(long)]
        open: bool,

        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// 新增订单
    AddOrder {
        order_code: String,

        /// 联系信息（姓名、电话、地址，按行分隔）
        contact: String,

        #[arg(short, long, default_value = "pending")]
        status: String,
    },

    /// 查看或初始化配置
    Config {
        /// 输出生效配置
        #[arg(long)]
        show: bool,

        /// 写入默认配置文件（已存在则不覆盖）
        #[arg(long)]
        init: bool,
    },
}
