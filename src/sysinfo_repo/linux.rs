// Linux-specific helpers: /proc/meminfo for active and buff/cache memory.

/// Memory figures sysinfo does not expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct MemInfo {
    pub active_bytes: Option<u64>,
    pub buff_cache_bytes: u64,
}

/// Read /proc/meminfo (Linux). None elsewhere or when unreadable.
pub(super) fn read_meminfo() -> Option<MemInfo> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/meminfo").ok()?;
        Some(parse_meminfo(&content))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Parses the kB fields we need; buff/cache = Buffers + Cached + SReclaimable.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(super) fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kb) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        let bytes = kb.saturating_mul(1024);
        match key.trim() {
            "Active" => info.active_bytes = Some(bytes),
            "Buffers" | "Cached" | "SReclaimable" => {
                info.buff_cache_bytes = info.buff_cache_bytes.saturating_add(bytes)
            }
            _ => {}
        }
    }
    info
}
