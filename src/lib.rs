//! zfiles - 文件浏览器核心库
//!
//! 模块结构：
//! - models: 数据模型（Entry, NavigationHistory, Tab, DirectoryTreeCache）
//! - kernel: 标签页管理、终端会话、服务层（文件系统、shell、设置）
//! - app: 应用层（Workbench, 控制台命令）

pub mod app;
pub mod kernel;
pub mod models;
