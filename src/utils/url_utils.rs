// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 提取主机名并去掉前导 www.（用于生成截图文件名）
pub fn hostname_stripped(url: &Url) -> String {
    url.host_str()
        .map(|host| host.replacen("www.", "", 1))
        .unwrap_or_default()
}
