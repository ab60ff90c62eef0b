//! Redis Lua scripts for atomic operations
//!
//! Every balance mutation is one script invocation: read, check, write and
//! transaction completion happen inside a single atomic unit, so a pending
//! row either settles together with its balance change or not at all.

/// Create a wallet hash unless it already exists.
///
/// Keys: [wallet_key]
/// Args: flat field/value pairs
///
/// Returns: 1 if created, 0 if the wallet already existed
pub const CREATE_WALLET_SCRIPT: &str = r#"
local wallet = KEYS[1]
if redis.call('EXISTS', wallet) == 1 then
  return 0
end
for i = 1, #ARGV, 2 do
  redis.call('HSET', wallet, ARGV[i], ARGV[i + 1])
end
return 1
"#;

/// Conditionally apply a balance delta.
///
/// Keys: [wallet_key]
/// Args: [balance_field, delta, counter_field ('' for none), now_ms]
///
/// Returns: {-2} wallet missing, {-1, before} insufficient funds,
///          {0, before, after} applied
pub const APPLY_BALANCE_SCRIPT: &str = r#"
local wallet = KEYS[1]
local field = ARGV[1]
local delta = tonumber(ARGV[2])
local counter = ARGV[3]
local now_ms = ARGV[4]

if redis.call('EXISTS', wallet) == 0 then
  return {-2}
end

local before = tonumber(redis.call('HGET', wallet, field) or '0')
local after = before + delta
if after < 0 then
  return {-1, before}
end

redis.call('HSET', wallet, field, tostring(after), 'updated_at_ms', now_ms)
if counter ~= '' then
  redis.call('HINCRBY', wallet, counter, math.abs(delta))
end

return {0, before, after}
"#;

/// Apply a balance delta and complete the pending transaction row in the
/// same atomic unit.
///
/// Keys: [wallet_key, tx_key, pending_index]
/// Args: [balance_field, delta, counter_field ('' for none), now_ms, tx_id]
///
/// Returns: same codes as APPLY_BALANCE_SCRIPT
pub const SETTLE_TRANSACTION_SCRIPT: &str = r#"
local wallet = KEYS[1]
local tx = KEYS[2]
local pending = KEYS[3]
local field = ARGV[1]
local delta = tonumber(ARGV[2])
local counter = ARGV[3]
local now_ms = ARGV[4]
local tx_id = ARGV[5]

if redis.call('EXISTS', wallet) == 0 then
  return {-2}
end

local before = tonumber(redis.call('HGET', wallet, field) or '0')
local after = before + delta
if after < 0 then
  return {-1, before}
end

redis.call('HSET', wallet, field, tostring(after), 'updated_at_ms', now_ms)
if counter ~= '' then
  redis.call('HINCRBY', wallet, counter, math.abs(delta))
end

redis.call('HSET', tx,
  'status', 'completed',
  'balance_before', tostring(before),
  'balance_after', tostring(after),
  'updated_at_ms', now_ms
)
redis.call('ZREM', pending, tx_id)

return {0, before, after}
"#;

/// Apply both conversion legs and complete the row. The recorded
/// balance_before/after pair is the source side (the debit the row's signed
/// amount describes).
///
/// Keys: [wallet_key, tx_key, pending_index]
/// Args: [from_field, debit, to_field, credit, now_ms, tx_id]
///
/// Returns: {-2} wallet missing, {-1, before} insufficient source funds,
///          {0, before, after} applied
pub const SETTLE_CONVERSION_SCRIPT: &str = r#"
local wallet = KEYS[1]
local tx = KEYS[2]
local pending = KEYS[3]
local from_field = ARGV[1]
local debit = tonumber(ARGV[2])
local to_field = ARGV[3]
local credit = tonumber(ARGV[4])
local now_ms = ARGV[5]
local tx_id = ARGV[6]

if redis.call('EXISTS', wallet) == 0 then
  return {-2}
end

local before = tonumber(redis.call('HGET', wallet, from_field) or '0')
local after = before - debit
if after < 0 then
  return {-1, before}
end

local to_before = tonumber(redis.call('HGET', wallet, to_field) or '0')
redis.call('HSET', wallet,
  from_field, tostring(after),
  to_field, tostring(to_before + credit),
  'updated_at_ms', now_ms
)

redis.call('HSET', tx,
  'status', 'completed',
  'balance_before', tostring(before),
  'balance_after', tostring(after),
  'updated_at_ms', now_ms
)
redis.call('ZREM', pending, tx_id)

return {0, before, after}
"#;

/// Flip the one-time welcome bonus flag.
///
/// Keys: [wallet_key]
/// Args: [now_ms]
///
/// Returns: -1 wallet missing, 1 claimed now, 0 already claimed
pub const CLAIM_WELCOME_BONUS_SCRIPT: &str = r#"
local wallet = KEYS[1]
local now_ms = ARGV[1]

if redis.call('EXISTS', wallet) == 0 then
  return -1
end

if redis.call('HGET', wallet, 'welcome_bonus_claimed') == '1' then
  return 0
end

redis.call('HSET', wallet, 'welcome_bonus_claimed', '1', 'updated_at_ms', now_ms)
return 1
"#;
