//! Server-side evaluation scripts
//!
//! Each script is the atomic unit of distribution correctness: read state,
//! run the bucket arithmetic, write state back, one serialised execution per
//! key. The arithmetic mirrors `core::algorithms` operation for operation;
//! the equivalence suite fails if they diverge.
//!
//! ARGV: `now, permit_limit, window, burst, precision, requested,
//! ttl_seconds, cooldown` (all in ticks except `ttl_seconds`). Reply:
//! `{allowed, state_value, now, retry_after, reset_after, used}` with
//! `state_value` rendered through `%.17g` so the f64 round-trip is exact.

use once_cell::sync::Lazy;
use redis::Script;

/// Token-bucket evaluation over hash fields `tokens` / `last_refill`
pub(crate) const TOKEN_BUCKET_LUA: &str = r#"
local now = tonumber(ARGV[1])
local permit_limit = tonumber(ARGV[2])
local window = tonumber(ARGV[3])
local burst = tonumber(ARGV[4])
local precision = tonumber(ARGV[5])
local requested = tonumber(ARGV[6])
local ttl = tonumber(ARGV[7])
local cooldown = tonumber(ARGV[8])

local rate = permit_limit / window

local state = redis.call('HMGET', KEYS[1], 'tokens', 'last_refill')
local tokens = tonumber(state[1])
local last_refill = tonumber(state[2])
if tokens == nil or last_refill == nil or last_refill == 0 then
  tokens = burst
  last_refill = now
end

local elapsed = now - last_refill
if elapsed < 0 then
  elapsed = 0
end
if elapsed > 0 then
  tokens = tokens + elapsed * rate
  if tokens > burst then
    tokens = burst
  end
end

if requested > burst then
  requested = burst
end

local allowed = 0
local retry_after = 0
local used = 0
if tokens >= requested then
  allowed = 1
  tokens = tokens - requested
  used = requested
else
  local shortage = requested - tokens
  retry_after = math.ceil(shortage / rate)
  if retry_after < precision then
    retry_after = precision
  end
  if retry_after > window then
    retry_after = window
  end
  if cooldown > 0 and retry_after < cooldown then
    retry_after = cooldown
  end
end

local reset_after = math.ceil((burst - tokens) / rate)
if reset_after < precision then
  reset_after = precision
end
if reset_after > window then
  reset_after = window
end

local stored = string.format('%.17g', tokens)
redis.call('HSET', KEYS[1], 'tokens', stored, 'last_refill', now)
redis.call('EXPIRE', KEYS[1], ttl)

return {allowed, stored, now, retry_after, reset_after, used}
"#;

/// Leaky-bucket evaluation over hash fields `water_level` / `last_drip`
pub(crate) const LEAKY_BUCKET_LUA: &str = r#"
local now = tonumber(ARGV[1])
local permit_limit = tonumber(ARGV[2])
local window = tonumber(ARGV[3])
local burst = tonumber(ARGV[4])
local precision = tonumber(ARGV[5])
local requested = tonumber(ARGV[6])
local ttl = tonumber(ARGV[7])
local cooldown = tonumber(ARGV[8])

local rate = permit_limit / window

local state = redis.call('HMGET', KEYS[1], 'water_level', 'last_drip')
local water_level = tonumber(state[1])
local last_drip = tonumber(state[2])
if water_level == nil or last_drip == nil or last_drip == 0 then
  water_level = 0
  last_drip = now
end

local elapsed = now - last_drip
if elapsed < 0 then
  elapsed = 0
end
if elapsed > 0 then
  water_level = water_level - elapsed * rate
  if water_level < 0 then
    water_level = 0
  end
end

if requested > burst then
  requested = burst
end

local allowed = 0
local retry_after = 0
local used = 0
if water_level + requested <= burst then
  allowed = 1
  water_level = water_level + requested
  used = requested
else
  local overflow = (water_level + requested) - burst
  retry_after = math.ceil(overflow / rate)
  if retry_after < precision then
    retry_after = precision
  end
  if retry_after > window then
    retry_after = window
  end
  if cooldown > 0 and retry_after < cooldown then
    retry_after = cooldown
  end
end

local reset_after = math.ceil(water_level / rate)
if reset_after < precision then
  reset_after = precision
end
if reset_after > window then
  reset_after = window
end

local stored = string.format('%.17g', water_level)
redis.call('HSET', KEYS[1], 'water_level', stored, 'last_drip', now)
redis.call('EXPIRE', KEYS[1], ttl)

return {allowed, stored, now, retry_after, reset_after, used}
"#;

pub(crate) static TOKEN_BUCKET_SCRIPT: Lazy<Script> =
    Lazy::new(|| Script::new(TOKEN_BUCKET_LUA));

pub(crate) static LEAKY_BUCKET_SCRIPT: Lazy<Script> =
    Lazy::new(|| Script::new(LEAKY_BUCKET_LUA));
