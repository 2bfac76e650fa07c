//! 诊断控制接口
//!
//! 控制接口接受一个十进制整数命令，由 [`LinkDevice::control_store`](crate::LinkDevice::control_store)
//! 在设备锁内执行。命令的输出是日志行，而不是结构化返回值。

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::config::{DUMP_ROW_SIZE, DUMP_WINDOW_HIGH, DUMP_WINDOW_LOW};
use crate::error::{LliError, LliResult};

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// 0: 打印驱动调试信息
    DumpStatus,
    /// 1: 初始化链路
    Init,
    /// 2: 设置为主端
    SetMaster,
    /// 3: 建链并挂载
    LinkStartupMount,
    /// 4: 关闭链路
    Exit,
    /// 5: 依次发送 32 个单比特信号
    SignalSweep,
    /// 6: 环回测试
    Loopback,
    /// 98: 转储共享内存低窗口
    DumpLow,
    /// 99: 转储共享内存高窗口
    DumpHigh,
}

impl ControlCommand {
    /// 解析控制接口写入的文本
    ///
    /// 跳过前导空白后读取一个可带符号的十进制整数，其后的内容被忽略（`"3abc"` 即命令 3）。
    /// 开头不是整数时返回 [`LliError::InvalidArgument`]，
    /// 未定义的命令返回 [`LliError::UnsupportedCommand`]。
    pub fn parse(buf: &str) -> LliResult<Self> {
        let text = buf.trim_start();
        let sign_len = usize::from(text.starts_with(['+', '-']));
        let digits = text[sign_len..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(LliError::InvalidArgument);
        }
        let code: i32 = text[..sign_len + digits]
            .parse()
            .map_err(|_| LliError::InvalidArgument)?;
        Self::try_from(code)
    }

    /// 命令码
    pub fn code(&self) -> i32 {
        match self {
            ControlCommand::DumpStatus => 0,
            ControlCommand::Init => 1,
            ControlCommand::SetMaster => 2,
            ControlCommand::LinkStartupMount => 3,
            ControlCommand::Exit => 4,
            ControlCommand::SignalSweep => 5,
            ControlCommand::Loopback => 6,
            ControlCommand::DumpLow => 98,
            ControlCommand::DumpHigh => 99,
        }
    }

    /// 转储命令对应的共享内存起始偏移
    pub fn dump_offset(&self) -> Option<usize> {
        match self {
            ControlCommand::DumpLow => Some(DUMP_WINDOW_LOW),
            ControlCommand::DumpHigh => Some(DUMP_WINDOW_HIGH),
            _ => None,
        }
    }
}

impl TryFrom<i32> for ControlCommand {
    type Error = LliError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ControlCommand::DumpStatus),
            1 => Ok(ControlCommand::Init),
            2 => Ok(ControlCommand::SetMaster),
            3 => Ok(ControlCommand::LinkStartupMount),
            4 => Ok(ControlCommand::Exit),
            5 => Ok(ControlCommand::SignalSweep),
            6 => Ok(ControlCommand::Loopback),
            98 => Ok(ControlCommand::DumpLow),
            99 => Ok(ControlCommand::DumpHigh),
            other => Err(LliError::UnsupportedCommand(other)),
        }
    }
}

/// 把字节按每行 16 字节格式化为十六进制转储
///
/// 行格式为 `<prefix><偏移:08x>: <十六进制>  <ASCII>`，偏移相对于 `bytes` 起始。
/// 不可打印字符显示为 `.`。
pub fn hex_dump_lines(prefix: &str, bytes: &[u8]) -> Vec<String> {
    // 十六进制区宽度：每字节 "xx " 去掉末尾空格，再留两个空格
    let ascii_column = DUMP_ROW_SIZE * 3 + 1;
    bytes
        .chunks(DUMP_ROW_SIZE)
        .enumerate()
        .map(|(row, chunk)| {
            let mut hex = String::with_capacity(ascii_column);
            for (i, byte) in chunk.iter().enumerate() {
                if i > 0 {
                    hex.push(' ');
                }
                hex.push_str(&format!("{:02x}", byte));
            }
            while hex.len() < ascii_column {
                hex.push(' ');
            }
            let ascii: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("{}{:08x}: {}{}", prefix, row * DUMP_ROW_SIZE, hex, ascii)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(ControlCommand::parse("0\n"), Ok(ControlCommand::DumpStatus));
        assert_eq!(ControlCommand::parse(" 3 "), Ok(ControlCommand::LinkStartupMount));
        assert_eq!(ControlCommand::parse("99"), Ok(ControlCommand::DumpHigh));
        assert_eq!(ControlCommand::DumpHigh.code(), 99);
    }

    #[test]
    fn test_parse_rejects_unknown_and_garbage() {
        assert_eq!(
            ControlCommand::parse("7"),
            Err(LliError::UnsupportedCommand(7))
        );
        assert_eq!(
            ControlCommand::parse("-1"),
            Err(LliError::UnsupportedCommand(-1))
        );
        assert_eq!(ControlCommand::parse("init"), Err(LliError::InvalidArgument));
        assert_eq!(ControlCommand::parse(""), Err(LliError::InvalidArgument));
        assert_eq!(ControlCommand::parse("-"), Err(LliError::InvalidArgument));
        assert_eq!(
            ControlCommand::parse("99999999999"),
            Err(LliError::InvalidArgument)
        );
    }

    #[test]
    fn test_parse_accepts_leading_integer() {
        assert_eq!(ControlCommand::parse("3abc"), Ok(ControlCommand::LinkStartupMount));
        assert_eq!(ControlCommand::parse("\t+5 trailing"), Ok(ControlCommand::SignalSweep));
        assert_eq!(ControlCommand::parse("98\n99"), Ok(ControlCommand::DumpLow));
        assert_eq!(
            ControlCommand::parse("7x"),
            Err(LliError::UnsupportedCommand(7))
        );
    }

    #[test]
    fn test_dump_offsets() {
        assert_eq!(ControlCommand::DumpLow.dump_offset(), Some(1024));
        assert_eq!(ControlCommand::DumpHigh.dump_offset(), Some(1024 + 512));
        assert_eq!(ControlCommand::Init.dump_offset(), None);
    }

    #[test]
    fn test_hex_dump_full_row() {
        let bytes: Vec<u8> = (0x41..0x51).collect();
        let lines = hex_dump_lines("llimem: ", &bytes);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "llimem: 00000000: 41 42 43 44 45 46 47 48 49 4a 4b 4c 4d 4e 4f 50  ABCDEFGHIJKLMNOP"
        );
    }

    #[test]
    fn test_hex_dump_partial_row_and_unprintable() {
        let mut bytes = [0u8; 18];
        bytes[16] = b'z';
        bytes[17] = 0x7f;
        let lines = hex_dump_lines("", &bytes);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("................"));
        assert!(lines[1].starts_with("00000010: 7a 7f "));
        assert!(lines[1].ends_with("z."));
        // ASCII 列在两行中对齐
        assert_eq!(lines[0].find("  .").map(|i| i + 2), lines[1].find("z."));
    }
}
