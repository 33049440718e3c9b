//! Recorded memcached replies for tests.
//!
//! Captured from a memcached 1.6 instance started with
//! `memcached -u memcache -m 64 -c 4096`, trimmed to fit one read buffer.

use super::filesystem::MockFs;
use super::transport::MockTransport;
use crate::collector::memcached::StatsCommand;

/// Pid reported by [`STATS_REPLY`].
pub const STATS_PID: u32 = 2714;

/// `stats` reply.
pub const STATS_REPLY: &str = "\
STAT pid 2714\r
STAT uptime 86412\r
STAT time 1718000000\r
STAT version 1.6.21\r
STAT libevent 2.1.12-stable\r
STAT pointer_size 64\r
STAT rusage_user 1.843217\r
STAT rusage_system 0.120000\r
STAT max_connections 4096\r
STAT curr_connections 10\r
STAT total_connections 1530\r
STAT rejected_connections 0\r
STAT connection_structures 12\r
STAT reserved_fds 20\r
STAT cmd_get 88412\r
STAT cmd_set 1290\r
STAT cmd_flush 0\r
STAT get_hits 80113\r
STAT get_misses 8299\r
STAT get_expired 14\r
STAT delete_misses 3\r
STAT delete_hits 101\r
STAT incr_misses 0\r
STAT incr_hits 0\r
STAT bytes_read 5211093\r
STAT bytes_written 91840021\r
STAT limit_maxbytes 67108864\r
STAT accepting_conns 1\r
STAT threads 4\r
STAT conn_yields 0\r
STAT hash_power_level 16\r
STAT hash_bytes 524288\r
STAT hash_is_expanding 0\r
STAT bytes 301245\r
STAT curr_items 1180\r
STAT total_items 1290\r
STAT expired_unfetched 2\r
STAT evicted_unfetched 0\r
STAT evictions 0\r
STAT reclaimed 9\r
END\r
";

/// `stats slabs` reply for the same instance.
pub const SLABS_REPLY: &str = "\
STAT 1:chunk_size 96\r
STAT 1:chunks_per_page 10922\r
STAT 1:total_pages 1\r
STAT 1:total_chunks 10922\r
STAT 1:used_chunks 402\r
STAT 1:free_chunks 10520\r
STAT 1:get_hits 30211\r
STAT 1:cmd_set 412\r
STAT 5:chunk_size 240\r
STAT 5:chunks_per_page 4369\r
STAT 5:total_pages 1\r
STAT 5:total_chunks 4369\r
STAT 5:used_chunks 778\r
STAT 5:free_chunks 3591\r
STAT 5:get_hits 49902\r
STAT 5:cmd_set 878\r
STAT active_slabs 2\r
STAT total_malloced 2097152\r
END\r
";

impl MockTransport {
    /// A server answering both commands with the recorded replies.
    pub fn typical_server(endpoint: &str) -> Self {
        let mut transport = Self::new();
        transport.add_response(endpoint, StatsCommand::Stats, STATS_REPLY);
        transport.add_response(endpoint, StatsCommand::Slabs, SLABS_REPLY);
        transport
    }
}

impl MockFs {
    /// `/proc` holding the command line of a memcached started with `-c <limit>`.
    pub fn memcached_process(pid: u32, limit: u32) -> Self {
        let mut fs = Self::new();
        let limit = limit.to_string();
        fs.add_cmdline(
            pid,
            &["/usr/bin/memcached", "-u", "memcache", "-m", "64", "-c", &limit],
        );
        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::memcached::connection::RESPONSE_BUFFER_SIZE;

    #[test]
    fn test_replies_fit_one_read() {
        assert!(STATS_REPLY.len() <= RESPONSE_BUFFER_SIZE);
        assert!(SLABS_REPLY.len() <= RESPONSE_BUFFER_SIZE);
    }
}
